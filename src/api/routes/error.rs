//! API error handling and the response envelope.
//!
//! Every operation answers `{success, data?, error?, message?}`;
//! failures map onto an HTTP status but still carry the envelope so
//! callers can always check `success` instead of catching exceptions.
//! The one exception is a missing login: that redirects instead of
//! erroring.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;
use uuid::Uuid;

use crate::services::ServiceError;

/// Where unauthenticated callers are sent.
pub const LOGIN_PATH: &str = "/api/v1/auth/login";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }
}

/// Handler-level error: a service failure wrapped for the wire.
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::Unauthorized => StatusCode::FORBIDDEN,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Invariant(_) => StatusCode::CONFLICT,
            ServiceError::Internal(e) => {
                tracing::error!("storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
            message: None,
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Extractor rejection for unauthenticated requests: a control-flow
/// escape to the login entry point, not an error envelope.
pub struct AuthRedirect;

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Validates an opaque id from the path before any store access.
pub fn parse_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError(ServiceError::Validation(format!(
            "Invalid {} id: {}",
            entity, raw
        )))
    })
}
