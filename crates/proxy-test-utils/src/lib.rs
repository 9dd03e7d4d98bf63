//! # Proxy Test Utilities
//!
//! Shared test utilities for the podcast proxy.
//!
//! This crate provides:
//! - Server test harness (`TestProxyServer` for E2E tests)
//! - Authorization header builder (`AuthHeaderBuilder`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use proxy_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let upstream = wiremock::MockServer::start().await;
//!     let server = TestProxyServer::spawn(&upstream.uri()).await?;
//!
//!     let header = AuthHeaderBuilder::new(1)
//!         .for_url(&format!("{}/search/byterm?q=rust", server.url()))
//!         .build();
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/search/byterm?q=rust", server.url()))
//!         .header("Authorization", header)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod auth_builders;
pub mod server_harness;

// Re-export commonly used items
pub use auth_builders::*;
pub use server_harness::*;
