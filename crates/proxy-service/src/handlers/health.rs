//! Handlers for the proxy's own endpoints.
//!
//! - `/health`: Liveness probe
//! - `/`: Service description

use crate::models::{AuthInfo, HealthResponse, ServiceInfo};
use crate::routes::AppState;
use crate::services::endpoints;
use axum::extract::State;
use axum::Json;
use common::auth_event::AUTH_SCHEME;
use std::sync::Arc;

/// Service name reported by `/`.
pub const SERVICE_NAME: &str = "podcast-proxy";

/// Liveness probe handler.
///
/// Does not touch the upstream: failure means the process is hung.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Service description handler.
#[tracing::instrument(skip_all, name = "proxy.handlers.info")]
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth: AuthInfo {
            enabled: state.config.nostr_auth_enabled,
            scheme: AUTH_SCHEME.to_string(),
            mode: state.config.allowlist.mode().to_string(),
        },
        endpoints: endpoints::all_paths().map(str::to_string).collect(),
    })
}
