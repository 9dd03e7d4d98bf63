//! Middleware for the proxy.
//!
//! # Components
//!
//! - `auth` - Claim gate for paths that require a signed authorization event
//! - `http_metrics` - HTTP request metrics middleware

pub mod auth;
pub mod http_metrics;

pub use auth::require_claim;
pub use http_metrics::http_metrics_middleware;
