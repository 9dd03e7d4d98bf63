//! Observability for the proxy.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
