//! Podcast Proxy Service Library
//!
//! This library provides the core functionality for the podcast proxy -
//! a stateless HTTP gateway in front of the upstream podcast directory API:
//!
//! - Forwarding an allowlist of read-only endpoints
//! - Signing upstream requests with the operator's API credentials
//! - Gating search-like endpoints behind a signed `Nostr` authorization event
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> services/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Access policy and verified identities
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Claim gate and HTTP metrics
//! - `models` - Response bodies
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Endpoint table and upstream client

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
