//! Observability setup.
//!
//! Request tracing is handled by the TraceLayer in main; this module
//! reads the OTEL environment variables so deployments that set them
//! get a clear log line about what is (and is not) exported.

use std::env;
use tracing::info;

/// Initialize observability from environment configuration.
pub fn init_observability() {
    let service_name = env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "clubforms-api".to_string());
    let otlp_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

    match otlp_endpoint {
        Some(endpoint) => info!(
            "Observability: service_name={}, OTLP endpoint configured ({}); spans stay in local tracing output",
            service_name, endpoint
        ),
        None => info!(
            "Observability initialized (OTLP export disabled - set OTEL_EXPORTER_OTLP_ENDPOINT to enable)"
        ),
    }
}
