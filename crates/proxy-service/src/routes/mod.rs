//! HTTP routes for the proxy.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_claim};
use crate::services::UpstreamClient;
use axum::{
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Minimum whole-request timeout in seconds.
const MIN_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Headroom over the upstream timeout so upstream timeouts surface as 502.
const REQUEST_TIMEOUT_HEADROOM_SECS: u64 = 5;

/// CORS preflight cache lifetime in seconds.
const CORS_MAX_AGE_SECS: u64 = 86400;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Client for the upstream API.
    pub upstream: UpstreamClient,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/` - Service description - claim gate, always open
/// - `/health` - Liveness probe - claim gate, always open
/// - `/static/*` - Files from `STATIC_DIR`, when configured
/// - `/metrics` - Prometheus metrics endpoint - outside the claim gate
/// - fallback - Allowlisted upstream endpoints behind the claim gate
/// - CORS for browser clients
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - Request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let request_timeout = request_timeout(&state.config);

    let mut gated_routes = Router::new()
        .route("/", get(handlers::service_info))
        .route("/health", get(handlers::health_check))
        .fallback(handlers::proxy_request);

    if let Some(dir) = &state.config.static_dir {
        gated_routes = gated_routes.nest_service("/static", ServeDir::new(dir));
    }

    // Layer after adding routes and fallback so both are gated
    let gated_routes = gated_routes
        .layer(middleware::from_fn_with_state(state.clone(), require_claim))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (bottom-to-top execution):
    // 1. CorsLayer - Answer preflights before the claim gate (innermost)
    // 2. TraceLayer - Log request details
    // 3. TimeoutLayer - Timeout the request
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    gated_routes
        .merge(metrics_routes)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(http_metrics_middleware))
}

/// CORS policy for browser clients: any origin, GET only.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS))
}

/// Whole-request timeout, always longer than the upstream timeout.
fn request_timeout(config: &Config) -> Duration {
    let secs = config
        .upstream_timeout_seconds
        .saturating_add(REQUEST_TIMEOUT_HEADROOM_SECS)
        .max(MIN_REQUEST_TIMEOUT_SECS);
    Duration::from_secs(secs)
}
