//! Metrics definitions for the issuer service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `issuer_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `cache_status`: hit, miss
//! - `status`: success, error
//! - `method`: HTTP verbs
//! - `path`: the fixed route table plus `/other`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its handle.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Signing is sub-millisecond; cache hits far below that.
        .set_buckets_for_metric(
            Matcher::Prefix("issuer_token_issuance".to_string()),
            &[
                0.0001, 0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("issuer_http_request".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `issuer_token_issuance_duration_seconds`, `issuer_token_issuance_total`
/// Labels: `cache_status`, `status`
pub fn record_token_issuance(cache_status: &str, status: &str, duration: Duration) {
    histogram!("issuer_token_issuance_duration_seconds", "cache_status" => cache_status.to_string(), "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("issuer_token_issuance_total", "cache_status" => cache_status.to_string(), "status" => status.to_string())
        .increment(1);
}

/// Metric: `issuer_assertion_cache_entries`
#[allow(clippy::cast_precision_loss)]
pub fn set_assertion_cache_entries(count: usize) {
    gauge!("issuer_assertion_cache_entries").set(count as f64);
}

// ============================================================================
// JWKS Metrics
// ============================================================================

/// Metric: `issuer_jwks_requests_total`
/// Labels: `status`
pub fn record_jwks_request(status: &str) {
    counter!("issuer_jwks_requests_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `issuer_http_requests_total`, `issuer_http_request_duration_seconds`
/// Labels: `method`, `path`, `status_code`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let normalized_path = normalize_path(path);

    histogram!("issuer_http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("issuer_http_requests_total",
        "method" => method.to_string(),
        "path" => normalized_path,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Map a request path onto the fixed route table.
fn normalize_path(path: &str) -> &'static str {
    match path {
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/get-es256-jwt" => "/api/get-es256-jwt",
        "/api/jwks" => "/api/jwks",
        "/.well-known/jwks.json" => "/.well-known/jwks.json",
        _ => "/other",
    }
}
