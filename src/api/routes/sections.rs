//! Section routes: update, delete, duplicate, and the section-scoped
//! field collection.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::models::{Field, FieldOption, FieldType, Section};
use crate::services::form_service::FieldInput;
use crate::services::ordering::OrderUpdate;

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiResponse, parse_id};

pub fn sections_router() -> Router<AppState> {
    Router::new()
        .route(
            "/{section_id}",
            get(get_section).put(update_section).delete(delete_section),
        )
        .route("/{section_id}/duplicate", post(duplicate_section))
        .route(
            "/{section_id}/fields",
            get(get_section_fields).post(create_field),
        )
        .route("/{section_id}/fields/reorder", put(reorder_fields))
}

/// GET /sections/:section_id
async fn get_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
) -> Result<Json<ApiResponse<Section>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    state.form_service.permissions().ensure_can_view(&auth.caller)?;
    let section = state
        .store
        .get_section(section_id)
        .await
        .map_err(crate::services::ServiceError::from)?
        .ok_or_else(|| crate::services::ServiceError::not_found("section", section_id))?;
    Ok(Json(ApiResponse::ok(section)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateSectionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

/// PUT /sections/:section_id
async fn update_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
    Json(request): Json<UpdateSectionRequest>,
) -> Result<Json<ApiResponse<Section>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    let section = state
        .form_service
        .update_section(
            &auth.caller,
            section_id,
            request.title.map(Some),
            request.order,
        )
        .await?;
    Ok(Json(ApiResponse::ok(section)))
}

/// DELETE /sections/:section_id - rejected for a form's only section
async fn delete_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    state
        .form_service
        .delete_section(&auth.caller, section_id)
        .await?;
    Ok(Json(ApiResponse::ok_with_message((), "Section deleted")))
}

/// POST /sections/:section_id/duplicate - copies the section and its
/// fields, appended at the end of the form
async fn duplicate_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
) -> Result<Json<ApiResponse<Section>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    let section = state
        .form_service
        .duplicate_section(&auth.caller, section_id)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(section, "Section duplicated")))
}

/// GET /sections/:section_id/fields - sorted by order
async fn get_section_fields(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Field>>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    let fields = state
        .form_service
        .get_section_fields(&auth.caller, section_id)
        .await?;
    Ok(Json(ApiResponse::ok(fields)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateFieldRequest {
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    /// Appended after the section's last field when omitted.
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

/// POST /sections/:section_id/fields
async fn create_field(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
    Json(request): Json<CreateFieldRequest>,
) -> Result<Json<ApiResponse<Field>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    let input = FieldInput {
        label: Some(request.label),
        placeholder: request.placeholder,
        field_type: Some(request.field_type),
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
        .create_field(&auth.caller, section_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(field)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReorderFieldsRequest {
    pub items: Vec<OrderUpdate>,
}

/// PUT /sections/:section_id/fields/reorder - all-or-nothing
async fn reorder_fields(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<String>,
    Json(request): Json<ReorderFieldsRequest>,
) -> Result<Json<ApiResponse<Vec<Field>>>, ApiError> {
    let section_id = parse_id(&section_id, "section")?;
    let fields = state
        .form_service
        .reorder_fields(&auth.caller, section_id, &request.items)
        .await?;
    Ok(Json(ApiResponse::ok(fields)))
}
