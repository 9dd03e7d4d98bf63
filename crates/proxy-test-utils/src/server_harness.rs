//! Test server harness for E2E testing
//!
//! Provides `TestProxyServer` for spawning real proxy instances in tests.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use proxy_service::config::Config;
use proxy_service::observability::metrics::init_metrics_recorder;
use proxy_service::routes::{self, AppState};
use proxy_service::services::UpstreamClient;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// API key every test server is configured with.
pub const TEST_API_KEY: &str = "TESTKEY";

/// API secret every test server is configured with.
pub const TEST_API_SECRET: &str = "TESTSECRET";

/// Global metrics handle shared by all test servers in one process.
///
/// The Prometheus recorder can only be installed once. Later servers reuse
/// the handle; if another crate installed a recorder first, fall back to an
/// unregistered one so `/metrics` still renders.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning the proxy in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_e2e() -> Result<()> {
///     let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestProxyServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestProxyServer {
    /// Spawn a proxy in open auth mode that forwards to `upstream_base_url`.
    pub async fn spawn(upstream_base_url: &str) -> Result<Self, anyhow::Error> {
        Self::spawn_with(upstream_base_url, &[]).await
    }

    /// Spawn a proxy with extra environment variables layered over the
    /// test defaults.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    ///
    /// # Arguments
    /// * `upstream_base_url` - Origin of the (usually mocked) upstream API
    /// * `overrides` - `(name, value)` pairs, e.g. `("AUTH_MODE", "restricted")`
    pub async fn spawn_with(
        upstream_base_url: &str,
        overrides: &[(&str, &str)],
    ) -> Result<Self, anyhow::Error> {
        let mut vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("PODCASTINDEX_API_KEY".to_string(), TEST_API_KEY.to_string()),
            (
                "PODCASTINDEX_API_SECRET".to_string(),
                TEST_API_SECRET.to_string(),
            ),
            (
                "PODCASTINDEX_BASE_URL".to_string(),
                upstream_base_url.to_string(),
            ),
            ("UPSTREAM_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ]);
        for (name, value) in overrides {
            vars.insert((*name).to_string(), (*value).to_string());
        }

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let upstream = UpstreamClient::new(&config)
            .map_err(|e| anyhow::anyhow!("Failed to create upstream client: {}", e))?;

        let state = Arc::new(AppState {
            config: config.clone(),
            upstream,
        });

        // Build routes using the service's real route builder
        let app = routes::build_routes(state, metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path_and_query`, as a client would sign it.
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.url(), path_and_query)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestProxyServer {
    fn drop(&mut self) {
        // Abort the HTTP server task so each test cleans up its listener
        self._handle.abort();
    }
}
