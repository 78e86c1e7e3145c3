//! Memory store behavior: cascades, write-time integrity, email
//! uniqueness, and the YAML snapshot.

use clubforms_api::models::{
    Field, FieldResponse, FieldType, Form, FormSubmission, Member, MemberRole, Section,
};
use clubforms_api::storage::{FormStore, MemoryStore, StoreError};
use uuid::Uuid;

struct TreeIds {
    form: Uuid,
    section: Uuid,
    field: Uuid,
}

async fn seed_tree(store: &MemoryStore) -> TreeIds {
    let form = Form::new("Signup".to_string(), None, Uuid::new_v4());
    let initial = Section::new(form.id, Some("Section 1".to_string()), 0);
    let form = store.create_form(form, initial).await.unwrap();
    let section = store.list_sections(form.id).await.unwrap().remove(0);
    let field = store
        .create_field(Field::new(
            section.id,
            "Name".to_string(),
            FieldType::Text,
            0,
        ))
        .await
        .unwrap();
    TreeIds {
        form: form.id,
        section: section.id,
        field: field.id,
    }
}

#[tokio::test]
async fn test_cascade_delete_removes_every_row() {
    let store = MemoryStore::new();
    let ids = seed_tree(&store).await;

    let submission = FormSubmission::new(ids.form, Some("sam@techsoc.example.org".to_string()));
    let response = FieldResponse::new(submission.id, ids.field, serde_json::json!("Sam"));
    let detail = store
        .create_submission(submission, vec![response])
        .await
        .unwrap();

    store.delete_form(ids.form).await.unwrap();

    assert!(store.get_form(ids.form).await.unwrap().is_none());
    assert!(store.get_section(ids.section).await.unwrap().is_none());
    assert!(store.get_field(ids.field).await.unwrap().is_none());
    assert!(
        store
            .get_submission(detail.submission.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(store.list_sections(ids.form).await.unwrap().is_empty());
    assert!(store.list_fields(ids.section).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_section_cascades_fields_only() {
    let store = MemoryStore::new();
    let ids = seed_tree(&store).await;

    store.delete_section(ids.section).await.unwrap();
    assert!(store.get_field(ids.field).await.unwrap().is_none());
    assert!(store.get_form(ids.form).await.unwrap().is_some());
}

#[tokio::test]
async fn test_submission_to_foreign_field_is_rejected() {
    let store = MemoryStore::new();
    let ids_a = seed_tree(&store).await;
    let ids_b = seed_tree(&store).await;

    // Response names a field that belongs to the other form.
    let submission = FormSubmission::new(ids_a.form, None);
    let stray = FieldResponse::new(submission.id, ids_b.field, serde_json::json!("x"));
    let result = store.create_submission(submission, vec![stray]).await;

    assert!(matches!(result, Err(StoreError::Integrity(_))));
    // Nothing was written: the submission list stays empty.
    assert!(store.list_submissions(ids_a.form).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_member_email_is_unique_case_insensitive() {
    let store = MemoryStore::new();
    store
        .create_member(Member::new(
            "Sam".to_string(),
            "sam@techsoc.example.org".to_string(),
            MemberRole::Member,
        ))
        .await
        .unwrap();

    let duplicate = store
        .create_member(Member::new(
            "Other Sam".to_string(),
            "SAM@techsoc.example.org".to_string(),
            MemberRole::Member,
        ))
        .await;
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn test_move_field_updates_parent_and_order() {
    let store = MemoryStore::new();
    let ids = seed_tree(&store).await;
    let form = store.get_form(ids.form).await.unwrap().unwrap();
    let second = store
        .create_section(Section::new(form.id, Some("Section 2".to_string()), 1))
        .await
        .unwrap();

    let moved = store.move_field(ids.field, second.id, 0).await.unwrap();
    assert_eq!(moved.section_id, second.id);
    assert_eq!(moved.order, 0);
    assert!(store.list_fields(ids.section).await.unwrap().is_empty());
    assert_eq!(store.list_fields(second.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.yaml");

    let ids = {
        let store = MemoryStore::with_snapshot(&path);
        seed_tree(&store).await
    };

    // A fresh store over the same snapshot sees the whole tree.
    let reloaded = MemoryStore::with_snapshot(&path);
    let tree = reloaded.get_form_tree(ids.form).await.unwrap().unwrap();
    assert_eq!(tree.sections.len(), 1);
    assert_eq!(tree.sections[0].fields.len(), 1);
    assert_eq!(tree.sections[0].fields[0].label, "Name");
}

#[tokio::test]
async fn test_reorder_rejects_duplicate_ids() {
    let store = MemoryStore::new();
    let ids = seed_tree(&store).await;
    let second = store
        .create_field(Field::new(
            ids.section,
            "Email".to_string(),
            FieldType::Email,
            1,
        ))
        .await
        .unwrap();

    let result = store
        .reorder_fields(ids.section, &[(ids.field, 1), (ids.field, 0)])
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));

    // Untouched.
    let fields = store.list_fields(ids.section).await.unwrap();
    assert_eq!(fields[0].id, ids.field);
    assert_eq!(fields[1].id, second.id);
}
