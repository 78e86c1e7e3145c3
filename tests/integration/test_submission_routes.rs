//! Submission flow: public intake gated on publication, required
//! fields, integrity, reset, and clone-with-submissions.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use clubforms_api::models::{Member, MemberRole};
use clubforms_api::routes::auth::SessionMetadata;
use clubforms_api::routes::{AppState, create_api_router};
use clubforms_api::services::page_cache::TracingPageCache;
use clubforms_api::services::{JwtService, OAuthService};
use clubforms_api::storage::MemoryStore;

const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

fn test_state() -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        JwtService::new(TEST_SECRET),
        OAuthService::new(String::new(), String::new(), String::new()),
        Arc::new(TracingPageCache),
    )
}

fn server(state: &AppState) -> TestServer {
    TestServer::new(create_api_router().with_state(state.clone())).unwrap()
}

async fn token_for(state: &AppState, email: &str, role: MemberRole) -> String {
    let name = email.split('@').next().unwrap_or("member").to_string();
    let member = state
        .store
        .create_member(Member::new(name, email.to_string(), role))
        .await
        .unwrap();
    let session_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();
    state.session_store.lock().await.insert(
        session_id.clone(),
        SessionMetadata {
            member_id: member.id,
            email: member.email.clone(),
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::days(1),
        },
    );
    state
        .jwt
        .generate_token_pair(email, member.id, &session_id)
        .unwrap()
        .access_token
}

fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Builds a published form with one required text field.
/// Returns (form_id, field_id).
async fn published_form(server: &TestServer, token: &str) -> (String, String) {
    let (header, value) = auth_header(token);
    let created: Value = server
        .post("/forms")
        .add_header(header, value)
        .json(&json!({"name": "RSVP"}))
        .await
        .json();
    let form_id = created["data"]["id"].as_str().unwrap().to_string();
    let section_id = created["data"]["sections"][0]["id"].as_str().unwrap();

    let (header, value) = auth_header(token);
    let field: Value = server
        .post(&format!("/sections/{}/fields", section_id))
        .add_header(header, value)
        .json(&json!({"label": "Name", "field_type": "text", "required": true}))
        .await
        .json();
    let field_id = field["data"]["id"].as_str().unwrap().to_string();

    let (header, value) = auth_header(token);
    server
        .post(&format!("/forms/{}/publish", form_id))
        .add_header(header, value)
        .json(&json!({"is_active": true}))
        .await
        .assert_status_ok();

    (form_id, field_id)
}

#[tokio::test]
async fn test_submit_and_list_round_trip() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let (form_id, field_id) = published_form(&server, &token).await;

    // Fill-out needs no builder token.
    let response = server
        .post(&format!("/forms/{}/submissions", form_id))
        .json(&json!({
            "submitted_by": "visitor@example.org",
            "responses": [{"field_id": field_id, "value": "Alex"}]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], json!(true));

    let (header, value) = auth_header(&token);
    let listing: Value = server
        .get(&format!("/forms/{}/submissions", form_id))
        .add_header(header, value)
        .await
        .json();
    let submissions = listing["data"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["responses"][0]["value"], json!("Alex"));
}

#[tokio::test]
async fn test_unpublished_form_rejects_submissions() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;

    let (header, value) = auth_header(&token);
    let created: Value = server
        .post("/forms")
        .add_header(header, value)
        .json(&json!({"name": "Draft"}))
        .await
        .json();
    let form_id = created["data"]["id"].as_str().unwrap();

    let response = server
        .post(&format!("/forms/{}/submissions", form_id))
        .json(&json!({"responses": []}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not accepting"));
}

#[tokio::test]
async fn test_missing_required_field_is_rejected() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let (form_id, _field_id) = published_form(&server, &token).await;

    let response = server
        .post(&format!("/forms/{}/submissions", form_id))
        .json(&json!({"responses": []}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Required field"));
    assert!(body["error"].as_str().unwrap().contains("Name"));
}

#[tokio::test]
async fn test_response_to_foreign_field_fails_whole_submission() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let (form_a, field_a) = published_form(&server, &token).await;
    let (_form_b, field_b) = published_form(&server, &token).await;

    let response = server
        .post(&format!("/forms/{}/submissions", form_a))
        .json(&json!({
            "responses": [
                {"field_id": field_a, "value": "ok"},
                {"field_id": field_b, "value": "stray"}
            ]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let (header, value) = auth_header(&token);
    let listing: Value = server
        .get(&format!("/forms/{}/submissions", form_a))
        .add_header(header, value)
        .await
        .json();
    assert!(listing["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_deletes_all_submissions() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let (form_id, field_id) = published_form(&server, &token).await;

    for who in ["a@example.org", "b@example.org", "c@example.org"] {
        server
            .post(&format!("/forms/{}/submissions", form_id))
            .json(&json!({
                "submitted_by": who,
                "responses": [{"field_id": field_id, "value": who}]
            }))
            .await
            .assert_status_ok();
    }

    let (header, value) = auth_header(&token);
    let reset: Value = server
        .delete(&format!("/forms/{}/submissions", form_id))
        .add_header(header, value)
        .await
        .json();
    assert_eq!(reset["data"], json!(3));

    let (header, value) = auth_header(&token);
    let listing: Value = server
        .get(&format!("/forms/{}/submissions", form_id))
        .add_header(header, value)
        .await
        .json();
    assert!(listing["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_single_submission() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let (form_id, field_id) = published_form(&server, &token).await;

    let submitted: Value = server
        .post(&format!("/forms/{}/submissions", form_id))
        .json(&json!({"responses": [{"field_id": field_id, "value": "x"}]}))
        .await
        .json();
    let submission_id = submitted["data"]["id"].as_str().unwrap();

    let (header, value) = auth_header(&token);
    server
        .delete(&format!("/submissions/{}", submission_id))
        .add_header(header, value)
        .await
        .assert_status_ok();

    let (header, value) = auth_header(&token);
    let missing = server
        .get(&format!("/submissions/{}", submission_id))
        .add_header(header, value)
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clone_with_submissions_remaps_responses() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let (form_id, field_id) = published_form(&server, &token).await;

    server
        .post(&format!("/forms/{}/submissions", form_id))
        .json(&json!({"responses": [{"field_id": field_id, "value": "carried"}]}))
        .await
        .assert_status_ok();

    let (header, value) = auth_header(&token);
    let cloned: Value = server
        .post(&format!("/forms/{}/clone", form_id))
        .add_header(header, value)
        .json(&json!({"title": "RSVP 2", "include_submissions": true}))
        .await
        .json();
    let clone_id = cloned["data"]["id"].as_str().unwrap().to_string();
    let clone_field_id = cloned["data"]["sections"][0]["fields"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(clone_field_id, field_id);

    let (header, value) = auth_header(&token);
    let listing: Value = server
        .get(&format!("/forms/{}/submissions", clone_id))
        .add_header(header, value)
        .await
        .json();
    let submissions = listing["data"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    // The response points at the cloned field, not the original.
    assert_eq!(
        submissions[0]["responses"][0]["field_id"],
        json!(clone_field_id)
    );
    assert_eq!(submissions[0]["responses"][0]["value"], json!("carried"));

    // The original's submissions are untouched.
    let (header, value) = auth_header(&token);
    let original: Value = server
        .get(&format!("/forms/{}/submissions", form_id))
        .add_header(header, value)
        .await
        .json();
    assert_eq!(original["data"].as_array().unwrap().len(), 1);
}
