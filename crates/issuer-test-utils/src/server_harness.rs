//! Test server harness for E2E testing
//!
//! Provides TestIssuerServer for spawning real issuer instances in tests.

use crate::crypto_fixtures::test_signing_key_secret;
use crate::test_ids::TEST_KEY_ID_1;
use issuer_service::config::{
    Config, CspConfig, DEFAULT_ASSERTION_CACHE_CAPACITY, DEFAULT_JWKS_MAX_AGE_SECONDS,
};
use issuer_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Configuration for a test issuer using the seeded key.
pub fn test_config(seed: u8) -> Result<Config, anyhow::Error> {
    Ok(Config {
        signing_key_pem: test_signing_key_secret(seed)?,
        key_id: TEST_KEY_ID_1.to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        assertion_cache_capacity: DEFAULT_ASSERTION_CACHE_CAPACITY,
        jwks_max_age_seconds: DEFAULT_JWKS_MAX_AGE_SECONDS,
        csp: CspConfig::default(),
    })
}

/// Test harness for spawning the issuer in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_issue_flow_e2e() -> Result<()> {
///     let server = TestIssuerServer::spawn(1).await?;
///     let client = reqwest::Client::new();
///
///     let response = client
///         .post(format!("{}/api/get-es256-jwt", server.url()))
///         .json(&serde_json::json!({ "did": "did:example:abc123" }))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestIssuerServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestIssuerServer {
    /// Spawn a server signing with the seeded test key.
    pub async fn spawn(seed: u8) -> Result<Self, anyhow::Error> {
        Self::spawn_with_config(test_config(seed)?).await
    }

    /// Spawn a server with an explicit configuration
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Load the signing key from `config`
    /// - Start the HTTP server in the background
    pub async fn spawn_with_config(config: Config) -> Result<Self, anyhow::Error> {
        let state = Arc::new(
            AppState::from_config(config)
                .map_err(|e| anyhow::anyhow!("Failed to build issuer state: {}", e))?,
        );

        // The global recorder can only be installed once per process; later
        // servers get a standalone recorder.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        let app = routes::build_routes(Arc::clone(&state), metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared state the server was built with
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get reference to the server configuration
    pub fn config(&self) -> &Config {
        &self.state.config
    }
}

impl Drop for TestIssuerServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
