use crate::errors::IssuerError;
use crate::models::Jwks;
use crate::observability::metrics::record_jwks_request;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::header::{HeaderMap, HeaderValue, CACHE_CONTROL},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle JWKS request
///
/// GET /api/jwks
/// GET /.well-known/jwks.json
///
/// Returns the single verification key in JWKS format (RFC 7517), cacheable
/// by browsers and shared caches for the configured max-age.
#[instrument(name = "issuer.jwks.get", skip_all, fields(status))]
pub async fn handle_get_jwks(
    State(state): State<Arc<AppState>>,
) -> Result<(HeaderMap, Json<Jwks>), IssuerError> {
    let result = cache_control(state.config.jwks_max_age_seconds);

    let status = if result.is_ok() { "success" } else { "error" };
    tracing::Span::current().record("status", status);
    record_jwks_request(status);

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, result?);

    Ok((headers, Json(state.publisher.publish())))
}

fn cache_control(max_age_seconds: u64) -> Result<HeaderValue, IssuerError> {
    HeaderValue::from_str(&format!("public, max-age={max_age_seconds}")).map_err(|e| {
        tracing::error!(target: "issuer.handlers", error = %e, "Failed to build Cache-Control header");
        IssuerError::Internal
    })
}
