//! Error types for the form store backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store operation errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreError {
    /// Entity not found
    #[error("{entity_type} not found: {entity_id}")]
    NotFound {
        entity_type: String,
        entity_id: String,
    },
    /// A bulk operation named an entity outside the claimed parent scope
    #[error("{entity_type} {entity_id} does not belong to {scope_type} {scope_id}")]
    ScopeMismatch {
        entity_type: String,
        entity_id: String,
        scope_type: String,
        scope_id: String,
    },
    /// Unique constraint violated (e.g. duplicate member email)
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Referential integrity violated (e.g. response to a field of another form)
    #[error("Integrity violation: {0}")]
    Integrity(String),
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// General storage error
    #[error("Storage error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn not_found(entity_type: &str, entity_id: impl ToString) -> Self {
        StoreError::NotFound {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
        }
    }
}
