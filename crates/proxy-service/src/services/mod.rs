//! Service layer for the proxy.
//!
//! # Components
//!
//! - `endpoints` - Allowlist of upstream endpoints and URL construction
//! - `upstream_client` - HTTP client for the upstream podcast API

pub mod endpoints;
pub mod upstream_client;

pub use endpoints::EndpointKind;
pub use upstream_client::{UpstreamClient, UpstreamResponse};
