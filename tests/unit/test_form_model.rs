#[cfg(test)]
mod tests {
    use clubforms_api::models::{Field, FieldLogic, FieldType, Form, Member, MemberRole, Section};
    use uuid::Uuid;

    #[test]
    fn test_form_creation() {
        let creator = Uuid::new_v4();
        let form = Form::new("Hack Night Signup".to_string(), None, creator);

        assert_eq!(form.name, "Hack Night Signup");
        assert_eq!(form.created_by, creator);
        assert!(!form.is_active);
        assert!(form.description.is_none());
    }

    #[test]
    fn test_field_serialization_defaults() {
        let section_id = Uuid::new_v4();
        let field = Field::new(section_id, "Your name".to_string(), FieldType::Text, 0);

        let json = serde_json::to_string(&field).unwrap();
        assert!(json.contains("Your name"));
        assert!(json.contains("\"field_type\":\"text\""));
        // Empty optional payloads are skipped on the wire.
        assert!(!json.contains("placeholder"));
        assert!(!json.contains("default_value"));
    }

    #[test]
    fn test_field_deserialization_fills_defaults() {
        let json = format!(
            r#"{{
                "id": "{}",
                "section_id": "{}",
                "label": "T-shirt size",
                "field_type": "select",
                "order": 2,
                "created_at": "2026-01-10T00:00:00Z",
                "updated_at": "2026-01-10T00:00:00Z"
            }}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );

        let field: Field = serde_json::from_str(&json).unwrap();
        assert_eq!(field.label, "T-shirt size");
        assert!(!field.required);
        assert!(field.options.is_empty());
        assert_eq!(field.order, 2);
    }

    #[test]
    fn test_choice_field_types() {
        assert!(FieldType::Select.is_choice());
        assert!(FieldType::Multiselect.is_choice());
        assert!(FieldType::Radio.is_choice());
        assert!(FieldType::Checkbox.is_choice());
        assert!(!FieldType::Text.is_choice());
        assert!(!FieldType::Signature.is_choice());
        assert!(!FieldType::Slider.is_choice());
    }

    #[test]
    fn test_section_defaults() {
        let form_id = Uuid::new_v4();
        let section = Section::new(form_id, Some("About you".to_string()), 3);
        assert_eq!(section.form_id, form_id);
        assert_eq!(section.order, 3);
        assert_eq!(section.title.as_deref(), Some("About you"));
    }

    #[test]
    fn test_member_roles() {
        assert!(MemberRole::Admin.is_elevated());
        assert!(MemberRole::Organizer.is_elevated());
        assert!(MemberRole::Lead.is_elevated());
        assert!(!MemberRole::Member.is_elevated());

        assert!(MemberRole::Admin.is_staff());
        assert!(MemberRole::Organizer.is_staff());
        assert!(!MemberRole::Lead.is_staff());

        let member = Member::new(
            "Sam".to_string(),
            "sam@techsoc.example.org".to_string(),
            MemberRole::Lead,
        );
        assert_eq!(member.role, MemberRole::Lead);
    }

    #[test]
    fn test_field_logic_parses_conditions() {
        let target = Uuid::new_v4();
        let raw = serde_json::json!({
            "action": "show",
            "conditions": [{"field_id": target, "operator": "equals", "value": "yes"}]
        });

        let logic = FieldLogic::parse(&raw).expect("logic should parse");
        assert_eq!(logic.conditions.len(), 1);
        assert_eq!(logic.conditions[0].field_id, target);
    }

    #[test]
    fn test_field_logic_rejects_malformed_payload() {
        let raw = serde_json::json!({"conditions": [{"field_id": "not-a-uuid"}]});
        assert!(FieldLogic::parse(&raw).is_none());

        // A free-form styling-like payload is simply not logic.
        let raw = serde_json::json!("show-always");
        assert!(FieldLogic::parse(&raw).is_none());
    }
}
