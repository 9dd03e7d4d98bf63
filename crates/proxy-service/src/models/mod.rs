//! Response models served by the proxy itself.

use serde::{Deserialize, Serialize};

/// Liveness response returned by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" while the process is serving requests.
    pub status: String,
}

/// Service description returned by `/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,

    /// Crate version.
    pub version: String,

    /// Claim gate settings.
    pub auth: AuthInfo,

    /// Paths that are forwarded upstream.
    pub endpoints: Vec<String>,
}

/// Claim gate settings advertised to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Whether protected paths check the `Authorization` header.
    pub enabled: bool,

    /// Authorization scheme keyword.
    pub scheme: String,

    /// `open` or `restricted`.
    pub mode: String,
}
