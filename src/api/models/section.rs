use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Section {
    pub id: Uuid,
    pub form_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Display position within the form. Unique per form, gaps allowed.
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Section {
    pub fn new(form_id: Uuid, title: Option<String>, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            form_id,
            title,
            order,
            created_at: now,
            updated_at: now,
        }
    }
}
