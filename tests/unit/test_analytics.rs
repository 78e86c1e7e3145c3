//! Analytics aggregation: rates, the zero-submission case, and the
//! insight thresholds.

use clubforms_api::models::{
    Field, FieldResponse, FieldType, Form, FormSubmission, FormTree, Section, SectionTree,
    SubmissionDetail,
};
use clubforms_api::services::analytics::aggregate;
use uuid::Uuid;

struct Fixture {
    tree: FormTree,
    name_field: Uuid,
    email_field: Uuid,
    feedback_field: Uuid,
}

fn fixture() -> Fixture {
    let form = Form::new("Event feedback".to_string(), None, Uuid::new_v4());
    let s1 = Section::new(form.id, Some("About you".to_string()), 0);
    let s2 = Section::new(form.id, Some("Feedback".to_string()), 1);
    let name = Field::new(s1.id, "Name".to_string(), FieldType::Text, 0);
    let email = Field::new(s1.id, "Email".to_string(), FieldType::Email, 1);
    let feedback = Field::new(s2.id, "Comments".to_string(), FieldType::Textarea, 0);
    Fixture {
        name_field: name.id,
        email_field: email.id,
        feedback_field: feedback.id,
        tree: FormTree {
            form,
            sections: vec![
                SectionTree {
                    section: s1,
                    fields: vec![name, email],
                },
                SectionTree {
                    section: s2,
                    fields: vec![feedback],
                },
            ],
        },
    }
}

fn submission(form_id: Uuid, answers: &[Uuid]) -> SubmissionDetail {
    let submission = FormSubmission::new(form_id, None);
    let responses = answers
        .iter()
        .map(|field_id| {
            FieldResponse::new(submission.id, *field_id, serde_json::json!("answer"))
        })
        .collect();
    SubmissionDetail {
        submission,
        responses,
    }
}

#[test]
fn test_zero_submissions_yields_zero_rates() {
    let fx = fixture();
    let analytics = aggregate(&fx.tree, &[]);

    assert_eq!(analytics.total_submissions, 0);
    assert_eq!(analytics.fields.len(), 3);
    for field in &analytics.fields {
        assert_eq!(field.completion_rate, 0.0);
        assert_eq!(field.response_count, 0);
    }
    for section in &analytics.sections {
        assert_eq!(section.engagement_rate, 0.0);
    }
    assert!(analytics.insights.iter().any(|i| i.contains("No submissions")));
}

#[test]
fn test_completion_rates_count_distinct_submissions() {
    let fx = fixture();
    let form_id = fx.tree.form.id;
    let submissions = vec![
        submission(form_id, &[fx.name_field, fx.email_field, fx.feedback_field]),
        submission(form_id, &[fx.name_field, fx.email_field]),
        submission(form_id, &[fx.name_field]),
        submission(form_id, &[fx.name_field]),
    ];

    let analytics = aggregate(&fx.tree, &submissions);
    assert_eq!(analytics.total_submissions, 4);

    let by_id = |id: Uuid| {
        analytics
            .fields
            .iter()
            .find(|f| f.field_id == id)
            .expect("field present")
    };
    assert_eq!(by_id(fx.name_field).completion_rate, 1.0);
    assert_eq!(by_id(fx.email_field).completion_rate, 0.5);
    assert_eq!(by_id(fx.feedback_field).completion_rate, 0.25);
}

#[test]
fn test_repeated_responses_to_one_field_count_once() {
    let fx = fixture();
    let form_id = fx.tree.form.id;
    // Same field answered twice within a single submission.
    let detail = submission(form_id, &[fx.name_field, fx.name_field]);

    let analytics = aggregate(&fx.tree, &[detail]);
    let name = analytics
        .fields
        .iter()
        .find(|f| f.field_id == fx.name_field)
        .unwrap();
    assert_eq!(name.response_count, 1);
    assert_eq!(name.completion_rate, 1.0);
}

#[test]
fn test_section_engagement_is_any_field_not_every_field() {
    let fx = fixture();
    let form_id = fx.tree.form.id;
    // Only the email field answered: section 1 still counts as engaged.
    let submissions = vec![
        submission(form_id, &[fx.email_field]),
        submission(form_id, &[fx.feedback_field]),
    ];

    let analytics = aggregate(&fx.tree, &submissions);
    assert_eq!(analytics.sections[0].engagement_rate, 0.5);
    assert_eq!(analytics.sections[1].engagement_rate, 0.5);
}

#[test]
fn test_threshold_insights() {
    let fx = fixture();
    let form_id = fx.tree.form.id;
    // 4 submissions: everyone answers name, one answers feedback.
    let submissions = vec![
        submission(form_id, &[fx.name_field, fx.feedback_field]),
        submission(form_id, &[fx.name_field]),
        submission(form_id, &[fx.name_field]),
        submission(form_id, &[fx.name_field]),
    ];

    let analytics = aggregate(&fx.tree, &submissions);
    // Below 10 submissions: the volume caveat shows up.
    assert!(
        analytics
            .insights
            .iter()
            .any(|i| i.contains("not be representative"))
    );
    // Name is above 0.9, Comments below 0.5.
    assert!(analytics.insights.iter().any(|i| i.contains("\"Name\"")));
    assert!(
        analytics
            .insights
            .iter()
            .any(|i| i.contains("Low completion") && i.contains("Comments"))
    );
}

#[test]
fn test_high_volume_insight() {
    let fx = fixture();
    let form_id = fx.tree.form.id;
    let submissions: Vec<_> = (0..120)
        .map(|_| submission(form_id, &[fx.name_field, fx.email_field, fx.feedback_field]))
        .collect();

    let analytics = aggregate(&fx.tree, &submissions);
    assert!(
        analytics
            .insights
            .iter()
            .any(|i| i.contains("Strong response volume"))
    );
}
