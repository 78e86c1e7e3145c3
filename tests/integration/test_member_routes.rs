//! Member management routes: admin-only writes, elevated reads,
//! email validation and uniqueness.

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

#[tokio::test]
async fn test_admin_creates_and_lists_members() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;

    let (header, value) = auth_header(&token);
    let created: Value = server
        .post("/members")
        .add_header(header, value)
        .json(&json!({
            "name": "Priya",
            "email": "priya@techsoc.example.org",
            "role": "lead",
            "bio": "Robotics lead"
        }))
        .await
        .json();
    assert_eq!(created["success"], json!(true));
    assert_eq!(created["data"]["role"], json!("lead"));

    let (header, value) = auth_header(&token);
    let listing: Value = server.get("/members").add_header(header, value).await.json();
    // The admin plus the new lead.
    assert_eq!(listing["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_organizer_cannot_write_members() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "organizer@techsoc.example.org", MemberRole::Organizer).await;

    let (header, value) = auth_header(&token);
    let response = server
        .post("/members")
        .add_header(header, value)
        .json(&json!({
            "name": "X",
            "email": "x@techsoc.example.org",
            "role": "member"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Reading is fine for any elevated role.
    let (header, value) = auth_header(&token);
    let listing = server.get("/members").add_header(header, value).await;
    assert_eq!(listing.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_plain_member_cannot_read_members() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "casual@techsoc.example.org", MemberRole::Member).await;

    let (header, value) = auth_header(&token);
    let response = server.get("/members").add_header(header, value).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;

    let (header, value) = auth_header(&token);
    let response = server
        .post("/members")
        .add_header(header, value)
        .json(&json!({"name": "Bad", "email": "not-an-email", "role": "member"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;

    let (header, value) = auth_header(&token);
    server
        .post("/members")
        .add_header(header, value)
        .json(&json!({"name": "One", "email": "dup@techsoc.example.org", "role": "member"}))
        .await
        .assert_status_ok();

    let (header, value) = auth_header(&token);
    let response = server
        .post("/members")
        .add_header(header, value)
        .json(&json!({"name": "Two", "email": "dup@techsoc.example.org", "role": "member"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_role_change_applies_to_next_request() {
    let state = test_state();
    let server = server(&state);
    let admin_token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let member_token = token_for(&state, "casual@techsoc.example.org", MemberRole::Member).await;

    // Denied as a plain member.
    let (header, value) = auth_header(&member_token);
    let denied = server.get("/forms").add_header(header, value).await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);

    // Promote them; the same token now passes because the role is read
    // from the member store on every request.
    let member = state
        .store
        .get_member_by_email("casual@techsoc.example.org")
        .await
        .unwrap()
        .unwrap();
    let (header, value) = auth_header(&admin_token);
    server
        .put(&format!("/members/{}", member.id))
        .add_header(header, value)
        .json(&json!({"role": "organizer"}))
        .await
        .assert_status_ok();

    let (header, value) = auth_header(&member_token);
    let allowed = server.get("/forms").add_header(header, value).await;
    assert_eq!(allowed.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let state = test_state();
    let server = server(&state);
    let token = token_for(&state, "admin@techsoc.example.org", MemberRole::Admin).await;
    let admin = state
        .store
        .get_member_by_email("admin@techsoc.example.org")
        .await
        .unwrap()
        .unwrap();

    let (header, value) = auth_header(&token);
    let response = server
        .delete(&format!("/members/{}", admin.id))
        .add_header(header, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}
