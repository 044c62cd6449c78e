//! HTTP routes for the issuer service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::crypto::SigningKey;
use crate::errors::IssuerError;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, ContentSecurityPolicy};
use crate::services::key_management_service::KeyPublisher;
use crate::services::token_service::TokenIssuer;
use axum::{
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
///
/// The issuer and publisher are built from the same signing key.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub issuer: TokenIssuer,
    pub publisher: KeyPublisher,
    pub csp: ContentSecurityPolicy,
}

impl AppState {
    /// Load the signing key and build the core components.
    ///
    /// # Errors
    ///
    /// `Configuration` if the key cannot be parsed or the CSP sources are
    /// invalid. Nothing is served in that case.
    pub fn from_config(config: Config) -> Result<Self, IssuerError> {
        let signing_key = Arc::new(SigningKey::from_pkcs8_pem(
            &config.signing_key_pem,
            &config.key_id,
        )?);

        let publisher = KeyPublisher::new(&signing_key)?;
        let issuer = TokenIssuer::new(signing_key, config.assertion_cache_capacity);
        let csp = ContentSecurityPolicy::from_config(&config.csp)?;

        Ok(Self {
            config,
            issuer,
            publisher,
            csp,
        })
    }
}

/// Build the application routes.
///
/// - `/api/get-es256-jwt` (POST) - issue an assertion
/// - `/api/jwks`, `/.well-known/jwks.json` (GET) - publish the key-set
/// - `/health` - liveness probe
/// - `/metrics` - Prometheus metrics
///
/// Unsupported methods on the API routes get 405, `OPTIONS` gets 200. Every
/// response carries CORS and Content-Security-Policy headers.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let csp_layer = state.csp.layer();

    let api_routes = Router::new()
        .route(
            "/api/get-es256-jwt",
            post(handlers::handle_get_token).fallback(handlers::method_fallback),
        )
        .route(
            "/api/jwks",
            get(handlers::handle_get_jwks).fallback(handlers::method_fallback),
        )
        .route(
            "/.well-known/jwks.json",
            get(handlers::handle_get_jwks).fallback(handlers::method_fallback),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - answers preflights, tags responses
    // 2. TraceLayer - log request details
    // 3. CSP header - applied to every response, preflights included
    // 4. http_metrics_middleware - record ALL responses (outermost)
    api_routes
        .merge(metrics_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(csp_layer)
        .layer(middleware::from_fn(http_metrics_middleware))
}
