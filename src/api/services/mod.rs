//! Services module - business rules for the form builder.

pub mod analytics;
pub mod form_service;
pub mod jwt_service;
pub mod oauth_service;
pub mod ordering;
pub mod page_cache;
pub mod permission;
pub mod validation;

pub use analytics::FormAnalytics;
pub use form_service::FormService;
pub use jwt_service::{Claims, JwtService, SharedJwtService, TokenPair, TokenType};
pub use oauth_service::OAuthService;
pub use page_cache::{PageCache, TracingPageCache};
pub use permission::{Caller, PermissionResolver};
pub use validation::ValidationReport;

use thiserror::Error;

use crate::storage::StoreError;

/// Errors surfaced by the service layer. Route handlers turn these into
/// the `{success: false, error}` envelope; they are never thrown past
/// the handler boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Caller lacks the role or ownership the operation requires.
    #[error("Unauthorized")]
    Unauthorized,
    /// Request was well-formed but violates a validation rule.
    #[error("{0}")]
    Validation(String),
    #[error("{entity_type} not found: {entity_id}")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },
    /// Structural invariant would be broken (last section, cross-form move).
    #[error("{0}")]
    Invariant(String),
    /// Persistence failure; the message shown to users is generic.
    #[error("Something went wrong. Please try again.")]
    Internal(#[source] StoreError),
}

impl ServiceError {
    pub fn not_found(entity_type: &str, entity_id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound {
                entity_type,
                entity_id,
            } => ServiceError::NotFound {
                entity_type,
                entity_id,
            },
            StoreError::ScopeMismatch { .. } => ServiceError::Validation(e.to_string()),
            StoreError::Conflict(msg) => ServiceError::Validation(msg),
            StoreError::Integrity(msg) => ServiceError::Invariant(msg),
            other => ServiceError::Internal(other),
        }
    }
}
