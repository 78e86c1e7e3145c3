//! Stale-path notification seam.
//!
//! Every successful mutation marks the affected page paths stale so the
//! site layer can regenerate them. The CRUD service only knows the
//! trait; what happens to the paths is the collaborator's business.

use uuid::Uuid;

pub trait PageCache: Send + Sync {
    fn mark_stale(&self, paths: &[String]);
}

/// Default collaborator: records the invalidation in the log stream.
pub struct TracingPageCache;

impl PageCache for TracingPageCache {
    fn mark_stale(&self, paths: &[String]) {
        tracing::debug!("marking page paths stale: {:?}", paths);
    }
}

/// Test collaborator: remembers every path it was handed.
pub struct RecordingPageCache {
    paths: std::sync::Mutex<Vec<String>>,
}

impl RecordingPageCache {
    pub fn new() -> Self {
        Self {
            paths: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn stale_paths(&self) -> Vec<String> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for RecordingPageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCache for RecordingPageCache {
    fn mark_stale(&self, paths: &[String]) {
        if let Ok(mut guard) = self.paths.lock() {
            guard.extend_from_slice(paths);
        }
    }
}

/// Paths affected by any mutation under one form.
pub fn form_paths(form_id: Uuid) -> Vec<String> {
    vec!["/forms".to_string(), format!("/forms/{}", form_id)]
}
