//! Team member routes. Listing and viewing need an elevated role;
//! writes are admin-only.

use std::sync::OnceLock;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;

use crate::models::{Member, MemberRole};
use crate::services::ServiceError;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiResponse, parse_id};

pub fn members_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_members).post(create_member))
        .route(
            "/{member_id}",
            get(get_member).put(update_member).delete(delete_member),
        )
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

fn check_email(email: &str) -> Result<(), ApiError> {
    if email_pattern().is_match(email) {
        Ok(())
    } else {
        Err(ApiError(ServiceError::Validation(format!(
            "Invalid email address: {}",
            email
        ))))
    }
}

/// GET /members
async fn list_members(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<Member>>>, ApiError> {
    state.form_service.permissions().ensure_can_view(&auth.caller)?;
    let members = state.store.list_members().await.map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::ok(members)))
}

/// GET /members/:member_id
async fn get_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(member_id): Path<String>,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    let member_id = parse_id(&member_id, "member")?;
    state.form_service.permissions().ensure_can_view(&auth.caller)?;
    let member = state
        .store
        .get_member(member_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::not_found("member", member_id))?;
    Ok(Json(ApiResponse::ok(member)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateMemberRequest {
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// POST /members - admin only
async fn create_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateMemberRequest>,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    state.form_service.permissions().ensure_admin(&auth.caller)?;
    if request.name.trim().is_empty() {
        return Err(ApiError(ServiceError::Validation(
            "Member name is required".to_string(),
        )));
    }
    check_email(&request.email)?;
    let mut member = Member::new(
        request.name.trim().to_string(),
        request.email.trim().to_lowercase(),
        request.role,
    );
    member.avatar_url = request.avatar_url;
    member.bio = request.bio;
    let member = state
        .store
        .create_member(member)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::ok_with_message(member, "Member added")))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<MemberRole>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// PUT /members/:member_id - admin only
async fn update_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(member_id): Path<String>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<ApiResponse<Member>>, ApiError> {
    let member_id = parse_id(&member_id, "member")?;
    state.form_service.permissions().ensure_admin(&auth.caller)?;
    let mut member = state
        .store
        .get_member(member_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::not_found("member", member_id))?;

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError(ServiceError::Validation(
                "Member name is required".to_string(),
            )));
        }
        member.name = name;
    }
    if let Some(email) = request.email {
        check_email(&email)?;
        member.email = email.trim().to_lowercase();
    }
    if let Some(role) = request.role {
        member.role = role;
    }
    if request.avatar_url.is_some() {
        member.avatar_url = request.avatar_url;
    }
    if request.bio.is_some() {
        member.bio = request.bio;
    }
    member.updated_at = Utc::now();
    let member = state
        .store
        .update_member(member)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::ok(member)))
}

/// DELETE /members/:member_id - admin only; admins cannot remove themselves
async fn delete_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(member_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let member_id = parse_id(&member_id, "member")?;
    state.form_service.permissions().ensure_admin(&auth.caller)?;
    if member_id == auth.caller.member_id {
        return Err(ApiError(ServiceError::Invariant(
            "Cannot remove your own account".to_string(),
        )));
    }
    state
        .store
        .delete_member(member_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::ok_with_message((), "Member removed")))
}
