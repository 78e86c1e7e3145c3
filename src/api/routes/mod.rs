//! API routes module - organizes all route handlers.

pub mod app_state;
pub mod auth;
pub mod auth_context;
pub mod error;
pub mod fields;
pub mod forms;
pub mod members;
pub mod openapi;
pub mod sections;
pub mod submissions;

use axum::Router;

pub use app_state::AppState;

/// Create the main API router combining all route modules.
///
/// Note: state is applied by callers (e.g. TestServer); for production
/// use, call `.with_state(app_state)` after creating the router.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/forms", forms::forms_router())
        .nest("/sections", sections::sections_router())
        .nest("/fields", fields::fields_router())
        .nest("/submissions", submissions::submissions_router())
        .nest("/members", members::members_router())
        .nest("/auth", auth::auth_router())
        .merge(openapi::openapi_router())
}
