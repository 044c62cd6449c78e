//! HTTP request handlers.

pub mod jwks_handler;
pub mod token_handler;

use crate::errors::IssuerError;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

pub use jwks_handler::handle_get_jwks;
pub use token_handler::handle_get_token;

/// Liveness probe.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Prometheus text exposition.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

/// Fallback for methods a route does not serve.
///
/// `OPTIONS` is answered with an empty 200 so bare preflights succeed even
/// without CORS request headers; anything else is a 405.
pub async fn method_fallback(method: Method) -> Result<StatusCode, IssuerError> {
    if method == Method::OPTIONS {
        Ok(StatusCode::OK)
    } else {
        tracing::debug!(target: "issuer.handlers", method = %method, "Method not allowed");
        Err(IssuerError::MethodNotAllowed)
    }
}
