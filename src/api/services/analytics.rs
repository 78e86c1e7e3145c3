//! Completion and drop-off statistics for a form.
//!
//! Pure reductions over the loaded tree and submissions; nothing here
//! persists state, every request recomputes from current data.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FormTree, SubmissionDetail};

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldCompletion {
    pub field_id: Uuid,
    pub label: String,
    /// Share of submissions with at least one response for this field.
    pub completion_rate: f64,
    pub response_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SectionEngagement {
    pub section_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Share of submissions that answered any field in this section.
    /// Measures engagement with the section, not completion of it.
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FormAnalytics {
    pub form_id: Uuid,
    pub total_submissions: usize,
    pub fields: Vec<FieldCompletion>,
    pub sections: Vec<SectionEngagement>,
    pub insights: Vec<String>,
}

/// Aggregates completion and engagement rates for one form.
///
/// With zero submissions every rate is 0.0; nothing divides by zero.
pub fn aggregate(tree: &FormTree, submissions: &[SubmissionDetail]) -> FormAnalytics {
    let total = submissions.len();

    // Field ids answered per submission, deduplicated up front so a
    // repeated response to the same field counts once.
    let answered: Vec<HashSet<Uuid>> = submissions
        .iter()
        .map(|s| s.responses.iter().map(|r| r.field_id).collect())
        .collect();

    let mut fields = Vec::new();
    let mut sections = Vec::new();

    for entry in &tree.sections {
        let mut engaged = 0usize;
        for submission_fields in &answered {
            if entry
                .fields
                .iter()
                .any(|f| submission_fields.contains(&f.id))
            {
                engaged += 1;
            }
        }
        sections.push(SectionEngagement {
            section_id: entry.section.id,
            title: entry.section.title.clone(),
            engagement_rate: rate(engaged, total),
        });

        for field in &entry.fields {
            let count = answered
                .iter()
                .filter(|submission_fields| submission_fields.contains(&field.id))
                .count();
            fields.push(FieldCompletion {
                field_id: field.id,
                label: field.label.clone(),
                completion_rate: rate(count, total),
                response_count: count,
            });
        }
    }

    let insights = derive_insights(&fields, &sections, total);

    FormAnalytics {
        form_id: tree.form.id,
        total_submissions: total,
        fields,
        sections,
        insights,
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Free-text hints from simple thresholds on the aggregated rates.
fn derive_insights(
    fields: &[FieldCompletion],
    sections: &[SectionEngagement],
    total: usize,
) -> Vec<String> {
    let mut insights = Vec::new();

    match total {
        0 => insights.push("No submissions yet".to_string()),
        n if n < 10 => insights.push(format!(
            "Only {} submissions so far; rates may not be representative",
            n
        )),
        n if n >= 100 => insights.push(format!("Strong response volume: {} submissions", n)),
        _ => {}
    }

    if total > 0 {
        for field in fields {
            if field.completion_rate < 0.5 {
                insights.push(format!(
                    "Low completion on \"{}\" ({:.0}%); consider making it simpler or optional",
                    field.label,
                    field.completion_rate * 100.0
                ));
            } else if field.completion_rate > 0.9 {
                insights.push(format!(
                    "\"{}\" is answered in {:.0}% of submissions",
                    field.label,
                    field.completion_rate * 100.0
                ));
            }
        }
        for (index, section) in sections.iter().enumerate() {
            if section.engagement_rate < 0.5 {
                let name = section
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Section {}", index + 1));
                insights.push(format!(
                    "{} loses most respondents ({:.0}% engagement)",
                    name,
                    section.engagement_rate * 100.0
                ));
            }
        }
    }

    insights
}
