use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::section::Section;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Form {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_by: Uuid,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    pub fn new(name: String, description: Option<String>, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            image_url: None,
            created_by,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A form with its section/field tree attached, sorted by `order`.
///
/// Orders may have gaps after deletions; readers sort ascending and
/// never assume a contiguous or zero-based sequence.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FormTree {
    #[serde(flatten)]
    pub form: Form,
    pub sections: Vec<SectionTree>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SectionTree {
    #[serde(flatten)]
    pub section: Section,
    pub fields: Vec<super::field::Field>,
}

/// Listing row for the all-forms view: counts instead of the full tree.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FormSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub section_count: usize,
    pub field_count: usize,
    pub submission_count: usize,
    pub updated_at: DateTime<Utc>,
}
