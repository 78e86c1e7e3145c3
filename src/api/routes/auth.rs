//! Authentication routes: GitHub OAuth, development login, token
//! refresh, and logout.
//!
//! Sessions live in an in-memory map keyed by session id; tokens are
//! JWT pairs minted by the JwtService. The member record is created on
//! first sign-in; the very first sign-in bootstraps the admin account.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{Member, MemberRole};
use crate::services::{ServiceError, TokenPair};

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiResponse};

/// Metadata tracked per live session.
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub member_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub type SessionStore = Arc<Mutex<HashMap<String, SessionMetadata>>>;

pub fn new_session_store() -> SessionStore {
    Arc::new(Mutex::new(HashMap::new()))
}

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_entry))
        .route("/github/callback", get(github_callback))
        .route("/dev-login", post(dev_login))
        .route("/refresh", post(refresh_tokens))
        .route("/logout", post(logout))
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct LoginEntry {
    pub authorize_url: String,
}

/// GET /auth/login - the login entry point unauthenticated callers are
/// redirected to. Hands back the GitHub authorization URL.
async fn login_entry(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LoginEntry>>, ApiError> {
    let csrf_state = Uuid::new_v4().to_string();
    let authorize_url = state.oauth.get_authorize_url(&csrf_state);
    Ok(Json(ApiResponse::ok(LoginEntry { authorize_url })))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    #[allow(dead_code)]
    pub state: Option<String>,
}

/// GET /auth/github/callback - completes the OAuth flow and returns a
/// token pair for the signed-in member.
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let access_token = state.oauth.exchange_code(&query.code).await.map_err(|e| {
        error!("GitHub code exchange failed: {}", e);
        ApiError(ServiceError::Validation("GitHub sign-in failed".to_string()))
    })?;
    let profile = state.oauth.fetch_profile(&access_token).await.map_err(|e| {
        error!("GitHub profile fetch failed: {}", e);
        ApiError(ServiceError::Validation("GitHub sign-in failed".to_string()))
    })?;

    let member = find_or_create_member(&state, &profile.email, &profile.display_name).await?;
    let tokens = open_session(&state, &member).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DevLoginRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// POST /auth/dev-login - development-only login that skips OAuth.
/// Rejected unless APP_ENV=development.
async fn dev_login(
    State(state): State<AppState>,
    Json(request): Json<DevLoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "production".to_string());
    if app_env.to_lowercase() != "development" {
        return Err(ApiError(ServiceError::Unauthorized));
    }
    let name = request
        .name
        .unwrap_or_else(|| request.email.split('@').next().unwrap_or("member").to_string());
    let member = find_or_create_member(&state, &request.email, &name).await?;
    let tokens = open_session(&state, &member).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /auth/refresh - exchanges a valid refresh token for a new pair.
async fn refresh_tokens(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let claims = state
        .jwt
        .validate_refresh_token(&request.refresh_token)
        .map_err(|e| ApiError(ServiceError::Validation(e)))?;

    let mut sessions = state.session_store.lock().await;
    let session = sessions
        .get_mut(&claims.session_id)
        .filter(|s| s.expires_at > Utc::now())
        .ok_or(ApiError(ServiceError::Unauthorized))?;
    session.last_activity = Utc::now();
    drop(sessions);

    let tokens = state
        .jwt
        .refresh_access_token(&request.refresh_token)
        .map_err(|e| ApiError(ServiceError::Validation(e)))?;
    Ok(Json(ApiResponse::ok(tokens)))
}

/// POST /auth/logout - revokes the caller's session.
async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if let Some(session_id) = auth.session_id {
        state.session_store.lock().await.remove(&session_id);
        info!("session revoked for {}", auth.caller.email);
    }
    Ok(Json(ApiResponse::ok_with_message((), "Logged out")))
}

/// Looks the member up by email, creating the record on first sign-in.
/// The first member ever created becomes the admin so the builder is
/// reachable on a fresh deployment.
async fn find_or_create_member(
    state: &AppState,
    email: &str,
    name: &str,
) -> Result<Member, ApiError> {
    if let Some(member) = state.store.get_member_by_email(email).await.map_err(ServiceError::from)? {
        return Ok(member);
    }
    let role = if state
        .store
        .list_members()
        .await
        .map_err(ServiceError::from)?
        .is_empty()
    {
        info!("bootstrapping first member {} as admin", email);
        MemberRole::Admin
    } else {
        MemberRole::Member
    };
    let member = state
        .store
        .create_member(Member::new(name.to_string(), email.to_string(), role))
        .await
        .map_err(ServiceError::from)?;
    Ok(member)
}

/// Creates a session and mints the token pair for it.
async fn open_session(state: &AppState, member: &Member) -> Result<TokenPair, ApiError> {
    let session_id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let metadata = SessionMetadata {
        member_id: member.id,
        email: member.email.clone(),
        created_at: now,
        last_activity: now,
        expires_at: now + Duration::days(7),
    };
    state
        .session_store
        .lock()
        .await
        .insert(session_id.clone(), metadata);

    state
        .jwt
        .generate_token_pair(&member.email, member.id, &session_id)
        .map_err(|e| {
            error!("token generation failed: {}", e);
            ApiError(ServiceError::Validation("Failed to issue tokens".to_string()))
        })
}
