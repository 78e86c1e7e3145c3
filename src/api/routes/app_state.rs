//! Application state management.
//!
//! Holds the shared state every route handler needs: the form service,
//! the store, the session store, and the JWT/OAuth services.

use std::sync::Arc;

use crate::services::form_service::FormService;
use crate::services::page_cache::{PageCache, TracingPageCache};
use crate::services::{JwtService, OAuthService, SharedJwtService};
use crate::storage::{FormStore, MemoryStore, PostgresStore, StoreError};

use super::auth::{SessionStore, new_session_store};

#[derive(Clone)]
pub struct AppState {
    /// Form tree CRUD, validation, analytics, submissions
    pub form_service: Arc<FormService>,
    /// Direct store access (member management, auth lookups)
    pub store: Arc<dyn FormStore>,
    /// In-memory session store for authentication
    pub session_store: SessionStore,
    pub jwt: SharedJwtService,
    pub oauth: Arc<OAuthService>,
}

impl AppState {
    /// Assemble state from explicit parts. Tests use this with an
    /// in-memory store and a fixed JWT secret.
    pub fn new(
        store: Arc<dyn FormStore>,
        jwt: JwtService,
        oauth: OAuthService,
        page_cache: Arc<dyn PageCache>,
    ) -> Self {
        Self {
            form_service: Arc::new(FormService::new(store.clone(), page_cache)),
            store,
            session_store: new_session_store(),
            jwt: Arc::new(jwt),
            oauth: Arc::new(oauth),
        }
    }

    /// Production state: PostgreSQL when DATABASE_URL is set, otherwise
    /// the in-memory registry (with a YAML snapshot when DATA_DIR is set).
    pub async fn from_env() -> Result<Self, StoreError> {
        let store: Arc<dyn FormStore> = if let Ok(database_url) = std::env::var("DATABASE_URL") {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .map_err(|e| StoreError::Connection(format!("Failed to connect: {}", e)))?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| StoreError::Connection(format!("Migration failed: {}", e)))?;
            Arc::new(PostgresStore::new(pool))
        } else if let Ok(data_dir) = std::env::var("DATA_DIR") {
            let path = std::path::Path::new(&data_dir).join("registry.yaml");
            Arc::new(MemoryStore::with_snapshot(&path))
        } else {
            Arc::new(MemoryStore::new())
        };

        Ok(Self::new(
            store,
            JwtService::from_env(),
            oauth_from_env(),
            Arc::new(TracingPageCache),
        ))
    }
}

fn oauth_from_env() -> OAuthService {
    let client_id = std::env::var("GITHUB_CLIENT_ID").unwrap_or_default();
    let client_secret = std::env::var("GITHUB_CLIENT_SECRET").unwrap_or_default();
    let redirect_uri = std::env::var("GITHUB_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:8081/api/v1/auth/github/callback".to_string());
    OAuthService::new(client_id, client_secret, redirect_uri)
}
