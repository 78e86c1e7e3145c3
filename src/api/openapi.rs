//! OpenAPI specification definition.
//!
//! Aggregates the wire schemas and security schemes for documentation
//! generation; the spec is served by `routes::openapi`.

use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    components(schemas(
        crate::models::Form,
        crate::models::FormTree,
        crate::models::SectionTree,
        crate::models::FormSummary,
        crate::models::Section,
        crate::models::Field,
        crate::models::FieldOption,
        crate::models::FieldType,
        crate::models::FormSubmission,
        crate::models::FieldResponse,
        crate::models::SubmissionDetail,
        crate::models::Member,
        crate::models::MemberRole,
        crate::services::ordering::OrderUpdate,
        crate::services::validation::ValidationReport,
        crate::services::analytics::FormAnalytics,
        crate::services::analytics::FieldCompletion,
        crate::services::analytics::SectionEngagement,
        crate::services::jwt_service::TokenPair,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "GitHub OAuth and session endpoints"),
        (name = "Forms", description = "Form CRUD, clone, publish, validate, analytics"),
        (name = "Sections", description = "Section CRUD and reordering"),
        (name = "Fields", description = "Field CRUD, reordering, and moves"),
        (name = "Submissions", description = "Form submissions and resets"),
        (name = "Members", description = "Team member management"),
        (name = "OpenAPI", description = "OpenAPI specification"),
    ),
    info(
        title = "Clubforms API",
        description = "REST API for the club site's form builder and member management",
        version = "1.0.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8081/api/v1", description = "Local development server")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();

        if openapi.components.is_none() {
            openapi.components = Some(utoipa::openapi::Components::new());
        }

        let components = openapi.components.as_mut().unwrap();
        use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
