//! Authentication context extractor.
//!
//! Validates the bearer token, checks the session is live, and reads
//! the caller's current role from the member store — every request,
//! never from the token — so a role change applies immediately.
//! A caller with no token is redirected to the login entry point; that
//! is control flow, not an error.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use tracing::warn;

use crate::models::MemberRole;
use crate::services::{Caller, JwtService};

use super::app_state::AppState;
use super::error::AuthRedirect;

#[derive(Clone, Debug)]
pub struct AuthContext {
    pub caller: Caller,
    pub session_id: Option<String>,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(JwtService::extract_bearer_token)
            .ok_or_else(|| {
                warn!("no authorization token provided");
                AuthRedirect
            })?;

        let claims = state.jwt.validate_access_token(token).map_err(|e| {
            warn!("JWT validation failed: {}", e);
            AuthRedirect
        })?;

        let sessions = state.session_store.lock().await;
        let live = sessions
            .get(&claims.session_id)
            .map(|s| s.expires_at > Utc::now())
            .unwrap_or(false);
        drop(sessions);
        if !live {
            warn!("session {} not found or expired", claims.session_id);
            return Err(AuthRedirect);
        }

        // Current role from the member store, not the token.
        let role = match state.store.get_member_by_email(&claims.sub).await {
            Ok(Some(member)) => member.role,
            Ok(None) => MemberRole::Member,
            Err(e) => {
                warn!("role lookup failed for {}: {}", claims.sub, e);
                return Err(AuthRedirect);
            }
        };

        Ok(AuthContext {
            caller: Caller::new(claims.member_id, claims.sub, role),
            session_id: Some(claims.session_id),
        })
    }
}
