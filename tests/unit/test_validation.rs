//! Structure validator: all violations accumulate, choice fields need
//! options, and conditional-logic cycles are caught.

use clubforms_api::models::{
    Field, FieldOption, FieldType, Form, FormTree, Section, SectionTree,
};
use clubforms_api::services::validation::validate_form_structure;
use uuid::Uuid;

fn form_named(name: &str) -> Form {
    Form::new(name.to_string(), None, Uuid::new_v4())
}

fn section_tree(form_id: Uuid, title: &str, order: i32, fields: Vec<Field>) -> SectionTree {
    SectionTree {
        section: Section::new(form_id, Some(title.to_string()), order),
        fields,
    }
}

fn labeled_field(section_id: Uuid, label: &str, field_type: FieldType, order: i32) -> Field {
    let mut field = Field::new(section_id, label.to_string(), field_type, order);
    if field_type.is_choice() {
        field.options = vec![
            FieldOption {
                label: "Yes".to_string(),
                value: "yes".to_string(),
            },
            FieldOption {
                label: "No".to_string(),
                value: "no".to_string(),
            },
        ];
    }
    field
}

#[test]
fn test_complete_form_passes() {
    let form = form_named("Feedback");
    let section_id = Uuid::new_v4();
    let tree = FormTree {
        sections: vec![section_tree(
            form.id,
            "About you",
            0,
            vec![
                labeled_field(section_id, "Name", FieldType::Text, 0),
                labeled_field(section_id, "Attending?", FieldType::Select, 1),
            ],
        )],
        form,
    };

    let report = validate_form_structure(&tree);
    assert!(report.valid, "unexpected issues: {:?}", report.issues);
    assert!(report.issues.is_empty());
}

#[test]
fn test_select_without_options_names_the_field() {
    let form = form_named("Feedback");
    let section_id = Uuid::new_v4();
    let mut broken = labeled_field(section_id, "T-shirt size", FieldType::Select, 0);
    broken.options.clear();
    let tree = FormTree {
        sections: vec![section_tree(form.id, "Swag", 0, vec![broken])],
        form,
    };

    let report = validate_form_structure(&tree);
    assert!(!report.valid);
    assert!(
        report.issues.iter().any(|i| i.contains("T-shirt size")),
        "issues should mention the field: {:?}",
        report.issues
    );
}

#[test]
fn test_all_violations_accumulate() {
    // Blank name, an empty section, and an unlabeled field: every
    // violation appears, not just the first.
    let form = form_named("   ");
    let section_id = Uuid::new_v4();
    let unlabeled = Field::new(section_id, "".to_string(), FieldType::Text, 0);
    let tree = FormTree {
        sections: vec![
            section_tree(form.id, "Empty", 0, Vec::new()),
            section_tree(form.id, "Partial", 1, vec![unlabeled]),
        ],
        form,
    };

    let report = validate_form_structure(&tree);
    assert!(!report.valid);
    assert!(report.issues.len() >= 3, "got {:?}", report.issues);
    assert!(report.issues.iter().any(|i| i.contains("name")));
    assert!(report.issues.iter().any(|i| i.contains("Empty")));
    assert!(report.issues.iter().any(|i| i.contains("label")));
}

#[test]
fn test_form_without_sections_fails() {
    let form = form_named("Feedback");
    let tree = FormTree {
        form,
        sections: Vec::new(),
    };

    let report = validate_form_structure(&tree);
    assert!(!report.valid);
    assert!(report.issues.iter().any(|i| i.contains("section")));
}

#[test]
fn test_logic_cycle_is_reported() {
    let form = form_named("Conditional");
    let section_id = Uuid::new_v4();
    let mut a = labeled_field(section_id, "A", FieldType::Text, 0);
    let mut b = labeled_field(section_id, "B", FieldType::Text, 1);
    a.logic = Some(serde_json::json!({
        "action": "show",
        "conditions": [{"field_id": b.id, "operator": "equals", "value": "x"}]
    }));
    b.logic = Some(serde_json::json!({
        "action": "show",
        "conditions": [{"field_id": a.id, "operator": "equals", "value": "y"}]
    }));
    let tree = FormTree {
        sections: vec![section_tree(form.id, "Loop", 0, vec![a, b])],
        form,
    };

    let report = validate_form_structure(&tree);
    assert!(!report.valid);
    assert!(report.issues.iter().any(|i| i.contains("cycle")));
}

#[test]
fn test_one_way_logic_reference_is_fine() {
    let form = form_named("Conditional");
    let section_id = Uuid::new_v4();
    let a = labeled_field(section_id, "A", FieldType::Text, 0);
    let mut b = labeled_field(section_id, "B", FieldType::Text, 1);
    b.logic = Some(serde_json::json!({
        "action": "show",
        "conditions": [{"field_id": a.id, "operator": "equals", "value": "x"}]
    }));
    let tree = FormTree {
        sections: vec![section_tree(form.id, "Chain", 0, vec![a, b])],
        form,
    };

    let report = validate_form_structure(&tree);
    assert!(report.valid, "unexpected issues: {:?}", report.issues);
}

#[test]
fn test_malformed_logic_payload_is_ignored() {
    let form = form_named("Conditional");
    let section_id = Uuid::new_v4();
    let mut a = labeled_field(section_id, "A", FieldType::Text, 0);
    a.logic = Some(serde_json::json!("always-show"));
    let tree = FormTree {
        sections: vec![section_tree(form.id, "Odd", 0, vec![a])],
        form,
    };

    let report = validate_form_structure(&tree);
    assert!(report.valid);
}
