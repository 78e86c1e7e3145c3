use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::FieldType;

/// One entry in a choice field's options list.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Field {
    pub id: Uuid,
    pub section_id: Uuid,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Display position within the section. Unique per section, gaps allowed.
    pub order: i32,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styling: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logic: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Field {
    pub fn new(section_id: Uuid, label: String, field_type: FieldType, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            section_id,
            label,
            placeholder: None,
            field_type,
            required: false,
            order,
            options: Vec::new(),
            default_value: None,
            validation: None,
            styling: None,
            logic: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Typed view of a field's `logic` payload.
///
/// The payload is open-ended JSON; callers that need the structure
/// (cycle detection) parse it with [`FieldLogic::parse`] and skip
/// fields whose payload does not match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldLogic {
    /// "show" or "hide"; anything else is passed through untouched.
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub conditions: Vec<LogicCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicCondition {
    pub field_id: Uuid,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl FieldLogic {
    pub fn parse(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
