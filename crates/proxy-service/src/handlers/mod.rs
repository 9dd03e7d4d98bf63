//! HTTP request handlers for the proxy.

pub mod health;
pub mod metrics;
pub mod proxy;

pub use health::{health_check, service_info};
pub use metrics::metrics_handler;
pub use proxy::proxy_request;
