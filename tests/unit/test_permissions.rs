//! Permission boundaries: plain members are rejected everywhere,
//! staff act on any form, leads only on their own.

use std::sync::Arc;

use clubforms_api::models::MemberRole;
use clubforms_api::services::form_service::FormService;
use clubforms_api::services::page_cache::RecordingPageCache;
use clubforms_api::services::{Caller, ServiceError};
use clubforms_api::storage::MemoryStore;
use uuid::Uuid;

fn caller(role: MemberRole) -> Caller {
    let id = Uuid::new_v4();
    Caller::new(id, format!("{}@techsoc.example.org", role), role)
}

fn service() -> FormService {
    FormService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingPageCache::new()),
    )
}

#[tokio::test]
async fn test_plain_member_is_rejected_everywhere() {
    let service = service();
    let admin = caller(MemberRole::Admin);
    let member = caller(MemberRole::Member);

    let tree = service
        .create_form(&admin, "Welfare survey", None, None)
        .await
        .unwrap();

    // Listing included: members do not see the builder at all.
    assert!(matches!(
        service.list_forms(&member).await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service.get_form(&member, tree.form.id).await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service.create_form(&member, "Nope", None, None).await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service.delete_form(&member, tree.form.id).await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service
            .create_section(&member, tree.form.id, None, None)
            .await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service.reset_submissions(&member, tree.form.id).await,
        Err(ServiceError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_staff_act_on_any_form() {
    let service = service();
    let lead = caller(MemberRole::Lead);
    let organizer = caller(MemberRole::Organizer);
    let admin = caller(MemberRole::Admin);

    let tree = service
        .create_form(&lead, "Project intake", None, None)
        .await
        .unwrap();

    // Organizers and admins may rename someone else's form.
    service
        .update_form(&organizer, tree.form.id, Some("Renamed".to_string()), None, None)
        .await
        .unwrap();
    service
        .update_form(&admin, tree.form.id, Some("Renamed again".to_string()), None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lead_limited_to_own_forms() {
    let service = service();
    let lead_a = caller(MemberRole::Lead);
    let lead_b = caller(MemberRole::Lead);

    let own = service
        .create_form(&lead_a, "Robotics signup", None, None)
        .await
        .unwrap();

    // Writes on another lead's form are rejected...
    assert!(matches!(
        service
            .update_form(&lead_b, own.form.id, Some("Hijack".to_string()), None, None)
            .await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service.delete_form(&lead_b, own.form.id).await,
        Err(ServiceError::Unauthorized)
    ));

    // ...but any elevated role may view.
    service.get_form(&lead_b, own.form.id).await.unwrap();

    // And the creator keeps full control.
    service
        .update_form(&lead_a, own.form.id, Some("Kept".to_string()), None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_section_and_field_checks_walk_up_to_the_form() {
    let service = service();
    let lead_a = caller(MemberRole::Lead);
    let lead_b = caller(MemberRole::Lead);

    let tree = service
        .create_form(&lead_a, "Mentoring form", None, None)
        .await
        .unwrap();
    let section_id = tree.sections[0].section.id;
    let field = service
        .create_field(
            &lead_a,
            section_id,
            clubforms_api::services::form_service::FieldInput {
                label: Some("Name".to_string()),
                field_type: Some(clubforms_api::models::FieldType::Text),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Mutating a section or field resolves ownership through the form.
    assert!(matches!(
        service
            .update_section(&lead_b, section_id, Some(Some("Taken".to_string())), None)
            .await,
        Err(ServiceError::Unauthorized)
    ));
    assert!(matches!(
        service.delete_field(&lead_b, field.id).await,
        Err(ServiceError::Unauthorized)
    ));
}
