//! Submission routes addressed by submission id.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::models::SubmissionDetail;
use crate::services::ServiceError;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiResponse, parse_id};

pub fn submissions_router() -> Router<AppState> {
    Router::new().route(
        "/{submission_id}",
        get(get_submission).delete(delete_submission),
    )
}

/// GET /submissions/:submission_id
async fn get_submission(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(submission_id): Path<String>,
) -> Result<Json<ApiResponse<SubmissionDetail>>, ApiError> {
    let submission_id = parse_id(&submission_id, "submission")?;
    state.form_service.permissions().ensure_can_view(&auth.caller)?;
    let detail = state
        .store
        .get_submission(submission_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| ServiceError::not_found("submission", submission_id))?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// DELETE /submissions/:submission_id
async fn delete_submission(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(submission_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let submission_id = parse_id(&submission_id, "submission")?;
    state
        .form_service
        .delete_submission(&auth.caller, submission_id)
        .await?;
    Ok(Json(ApiResponse::ok_with_message((), "Submission deleted")))
}
