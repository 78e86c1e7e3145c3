use serde::{Deserialize, Serialize};

/// Input kinds the builder can place on a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Email,
    Phone,
    Number,
    Select,
    Multiselect,
    Radio,
    Checkbox,
    Date,
    Time,
    File,
    Signature,
    Slider,
    Rating,
}

impl FieldType {
    /// Choice kinds carry an options list and are invalid without one.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Multiselect | FieldType::Radio | FieldType::Checkbox
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Organizer,
    Lead,
    Member,
}

impl MemberRole {
    /// Roles allowed into the form builder at all.
    pub fn is_elevated(&self) -> bool {
        !matches!(self, MemberRole::Member)
    }

    /// Roles that may act on any form regardless of creator.
    pub fn is_staff(&self) -> bool {
        matches!(self, MemberRole::Admin | MemberRole::Organizer)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MemberRole::Admin => "admin",
            MemberRole::Organizer => "organizer",
            MemberRole::Lead => "lead",
            MemberRole::Member => "member",
        };
        f.write_str(name)
    }
}
