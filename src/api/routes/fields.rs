//! Field routes: update, delete, duplicate, move.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Field, FieldOption, FieldType};
use crate::services::form_service::FieldInput;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiResponse, parse_id};

pub fn fields_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{field_id}",
            get(get_field).put(update_field).delete(delete_field),
        )
        .route("/{field_id}/duplicate", post(duplicate_field))
        .route("/{field_id}/move", post(move_field))
}

/// GET /fields/:field_id
async fn get_field(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(field_id): Path<String>,
) -> Result<Json<ApiResponse<Field>>, ApiError> {
    let field_id = parse_id(&field_id, "field")?;
    state.form_service.permissions().ensure_can_view(&auth.caller)?;
    let field = state
        .store
        .get_field(field_id)
        .await
        .map_err(crate::services::ServiceError::from)?
        .ok_or_else(|| crate::services::ServiceError::not_found("field", field_id))?;
    Ok(Json(ApiResponse::ok(field)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateFieldRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub validation: Option<serde_json::Value>,
    #[serde(default)]
    pub styling: Option<serde_json::Value>,
    #[serde(default)]
    pub logic: Option<serde_json::Value>,
}

/// PUT /fields/:field_id
async fn update_field(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(field_id): Path<String>,
    Json(request): Json<UpdateFieldRequest>,
) -> Result<Json<ApiResponse<Field>>, ApiError> {
    let field_id = parse_id(&field_id, "field")?;
    let input = FieldInput {
        label: request.label,
        placeholder: request.placeholder,
        field_type: request.field_type,
        required: request.required,
        order: request.order,
        options: request.options,
        default_value: request.default_value,
        validation: request.validation,
        styling: request.styling,
        logic: request.logic,
    };
    let field = state
        .form_service
        .update_field(&auth.caller, field_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(field)))
}

/// DELETE /fields/:field_id
async fn delete_field(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(field_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let field_id = parse_id(&field_id, "field")?;
    state.form_service.delete_field(&auth.caller, field_id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "Field deleted")))
}

/// POST /fields/:field_id/duplicate - appended at the end of its section
async fn duplicate_field(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(field_id): Path<String>,
) -> Result<Json<ApiResponse<Field>>, ApiError> {
    let field_id = parse_id(&field_id, "field")?;
    let field = state
        .form_service
        .duplicate_field(&auth.caller, field_id)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(field, "Field duplicated")))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MoveFieldRequest {
    pub new_section_id: Uuid,
    /// Appended in the destination when omitted.
    #[serde(default)]
    pub new_order: Option<i32>,
}

/// POST /fields/:field_id/move - cross-section within the same form only
async fn move_field(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(field_id): Path<String>,
    Json(request): Json<MoveFieldRequest>,
) -> Result<Json<ApiResponse<Field>>, ApiError> {
    let field_id = parse_id(&field_id, "field")?;
    let field = state
        .form_service
        .move_field(
            &auth.caller,
            field_id,
            request.new_section_id,
            request.new_order,
        )
        .await?;
    Ok(Json(ApiResponse::ok(field)))
}
