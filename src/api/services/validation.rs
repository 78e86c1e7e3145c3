//! Publish-time structure validation.
//!
//! Walks the whole tree and accumulates every violation rather than
//! stopping at the first, so the builder UI can show the complete list.

use std::collections::HashMap;

use petgraph::Graph;
use petgraph::algo::is_cyclic_directed;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FieldLogic, FormTree};

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

/// Checks that a form meets the minimum publishing constraints:
/// a name, at least one section, at least one labeled field per
/// section, options on every choice field, and no cycles in
/// conditional-display references.
pub fn validate_form_structure(tree: &FormTree) -> ValidationReport {
    let mut issues = Vec::new();

    if tree.form.name.trim().is_empty() {
        issues.push("Form name must not be blank".to_string());
    }

    if tree.sections.is_empty() {
        issues.push("Form must have at least one section".to_string());
    }

    for (index, entry) in tree.sections.iter().enumerate() {
        let section_name = entry
            .section
            .title
            .clone()
            .unwrap_or_else(|| format!("Section {}", index + 1));
        if entry.fields.is_empty() {
            issues.push(format!("{} has no fields", section_name));
        }
        for field in &entry.fields {
            if field.label.trim().is_empty() {
                issues.push(format!(
                    "{} contains a field without a label",
                    section_name
                ));
            }
            if field.field_type.is_choice() && field.options.is_empty() {
                let label = if field.label.trim().is_empty() {
                    "unnamed field".to_string()
                } else {
                    format!("field \"{}\"", field.label)
                };
                issues.push(format!("{} in {} has no options", label, section_name));
            }
        }
    }

    if has_logic_cycle(tree) {
        issues.push("Conditional display rules reference each other in a cycle".to_string());
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
    }
}

/// Builds the field dependency graph from `logic` payloads and checks
/// it for cycles. Malformed payloads are skipped, not reported.
fn has_logic_cycle(tree: &FormTree) -> bool {
    let mut graph = Graph::<Uuid, ()>::new();
    let mut node_map = HashMap::new();

    for entry in &tree.sections {
        for field in &entry.fields {
            node_map
                .entry(field.id)
                .or_insert_with(|| graph.add_node(field.id));
        }
    }

    for entry in &tree.sections {
        for field in &entry.fields {
            let Some(logic) = field.logic.as_ref().and_then(FieldLogic::parse) else {
                continue;
            };
            for condition in &logic.conditions {
                if let (Some(&from), Some(&to)) =
                    (node_map.get(&field.id), node_map.get(&condition.field_id))
                {
                    graph.add_edge(from, to, ());
                }
            }
        }
    }

    is_cyclic_directed(&graph)
}
