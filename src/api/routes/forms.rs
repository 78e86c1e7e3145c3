//! Form routes: CRUD, clone, publish, validate, analytics, and the
//! form-scoped section and submission collections.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Form, FormSummary, FormTree, Section, SubmissionDetail};
use crate::services::ordering::OrderUpdate;
use crate::services::{FormAnalytics, ValidationReport};

use super::app_state::AppState;
use super::auth_context::AuthContext;
use super::error::{ApiError, ApiResponse, parse_id};

pub fn forms_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_forms).post(create_form))
        .route(
            "/{form_id}",
            get(get_form).put(update_form).delete(delete_form),
        )
        .route("/{form_id}/clone", post(clone_form))
        .route("/{form_id}/publish", post(publish_form))
        .route("/{form_id}/validate", get(validate_form))
        .route("/{form_id}/analytics", get(form_analytics))
        .route("/{form_id}/sections", post(create_section))
        .route("/{form_id}/sections/reorder", put(reorder_sections))
        .route(
            "/{form_id}/submissions",
            post(submit_form).get(list_submissions).delete(reset_submissions),
        )
        .route("/{form_id}/submissions/reset", delete(reset_submissions))
}

/// GET /forms - list all forms with counts
async fn get_forms(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<FormSummary>>>, ApiError> {
    let forms = state.form_service.list_forms(&auth.caller).await?;
    Ok(Json(ApiResponse::ok(forms)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateFormRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// POST /forms - create a form with its initial section
async fn create_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateFormRequest>,
) -> Result<Json<ApiResponse<FormTree>>, ApiError> {
    let tree = state
        .form_service
        .create_form(
            &auth.caller,
            &request.name,
            request.description,
            request.image_url,
        )
        .await?;
    Ok(Json(ApiResponse::ok_with_message(tree, "Form created")))
}

/// GET /forms/:form_id - full tree, sections and fields sorted by order
async fn get_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
) -> Result<Json<ApiResponse<FormTree>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let tree = state.form_service.get_form(&auth.caller, form_id).await?;
    Ok(Json(ApiResponse::ok(tree)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateFormRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// PUT /forms/:form_id - update name/description/image
async fn update_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
    Json(request): Json<UpdateFormRequest>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let form = state
        .form_service
        .update_form(
            &auth.caller,
            form_id,
            request.name,
            request.description.map(Some),
            request.image_url.map(Some),
        )
        .await?;
    Ok(Json(ApiResponse::ok(form)))
}

/// DELETE /forms/:form_id - cascades sections, fields, submissions
async fn delete_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    state.form_service.delete_form(&auth.caller, form_id).await?;
    Ok(Json(ApiResponse::ok_with_message((), "Form deleted")))
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CloneFormRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub include_submissions: bool,
}

/// POST /forms/:form_id/clone - deep copy, optionally with submissions
async fn clone_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
    request: Option<Json<CloneFormRequest>>,
) -> Result<Json<ApiResponse<FormTree>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let tree = state
        .form_service
        .clone_form(
            &auth.caller,
            form_id,
            request.title,
            request.include_submissions,
        )
        .await?;
    Ok(Json(ApiResponse::ok_with_message(tree, "Form duplicated")))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PublishFormRequest {
    pub is_active: bool,
}

/// POST /forms/:form_id/publish - runs the structure validator when activating
async fn publish_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
    Json(request): Json<PublishFormRequest>,
) -> Result<Json<ApiResponse<Form>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let form = state
        .form_service
        .publish_form(&auth.caller, form_id, request.is_active)
        .await?;
    let message = if form.is_active {
        "Form published"
    } else {
        "Form unpublished"
    };
    Ok(Json(ApiResponse::ok_with_message(form, message)))
}

/// GET /forms/:form_id/validate - read-only structure check
async fn validate_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
) -> Result<Json<ApiResponse<ValidationReport>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let report = state.form_service.validate_form(&auth.caller, form_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /forms/:form_id/analytics - completion/drop-off aggregation
async fn form_analytics(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
) -> Result<Json<ApiResponse<FormAnalytics>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let analytics = state
        .form_service
        .form_analytics(&auth.caller, form_id)
        .await?;
    Ok(Json(ApiResponse::ok(analytics)))
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CreateSectionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

/// POST /forms/:form_id/sections - append or insert a section
async fn create_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
    request: Option<Json<CreateSectionRequest>>,
) -> Result<Json<ApiResponse<Section>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let section = state
        .form_service
        .create_section(&auth.caller, form_id, request.title, request.order)
        .await?;
    Ok(Json(ApiResponse::ok(section)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReorderRequest {
    pub items: Vec<OrderUpdate>,
}

/// PUT /forms/:form_id/sections/reorder - all-or-nothing bulk reorder
async fn reorder_sections(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<Section>>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let sections = state
        .form_service
        .reorder_sections(&auth.caller, form_id, &request.items)
        .await?;
    Ok(Json(ApiResponse::ok(sections)))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitFormRequest {
    #[serde(default)]
    pub submitted_by: Option<String>,
    pub responses: Vec<SubmittedResponse>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmittedResponse {
    pub field_id: Uuid,
    pub value: serde_json::Value,
}

/// POST /forms/:form_id/submissions - end-user fill-out; no builder
/// permission, the gate is that the form is live.
async fn submit_form(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Json(request): Json<SubmitFormRequest>,
) -> Result<Json<ApiResponse<SubmissionDetail>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let values = request
        .responses
        .into_iter()
        .map(|r| (r.field_id, r.value))
        .collect();
    let detail = state
        .form_service
        .submit_form(form_id, request.submitted_by, values)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(detail, "Submission received")))
}

/// GET /forms/:form_id/submissions - list submissions with responses
async fn list_submissions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SubmissionDetail>>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let submissions = state
        .form_service
        .list_submissions(&auth.caller, form_id)
        .await?;
    Ok(Json(ApiResponse::ok(submissions)))
}

/// DELETE /forms/:form_id/submissions - form reset, drops everything
async fn reset_submissions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(form_id): Path<String>,
) -> Result<Json<ApiResponse<usize>>, ApiError> {
    let form_id = parse_id(&form_id, "form")?;
    let removed = state
        .form_service
        .reset_submissions(&auth.caller, form_id)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        removed,
        format!("{} submissions removed", removed),
    )))
}
