use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FormSubmission {
    pub id: Uuid,
    pub form_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission {
    pub fn new(form_id: Uuid, submitted_by: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            submitted_by,
            submitted_at: Utc::now(),
        }
    }
}

/// One answer within a submission. The referenced field must belong to
/// the same form as the owning submission; the store rejects writes
/// that break this.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldResponse {
    pub id: Uuid,
    pub submission_id: Uuid,
    pub field_id: Uuid,
    pub value: serde_json::Value,
}

impl FieldResponse {
    pub fn new(submission_id: Uuid, field_id: Uuid, value: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            submission_id,
            field_id,
            value,
        }
    }
}

/// A submission with its responses attached.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: FormSubmission,
    pub responses: Vec<FieldResponse>,
}
