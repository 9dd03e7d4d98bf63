//! Common utilities and types shared across the podcast proxy crates.

#![warn(clippy::pedantic)]

/// Module for authorization rejection reasons
pub mod error;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for decoding `Nostr` authorization headers into events
pub mod auth_event;

/// Module for URL canonicalization used by URL binding checks
pub mod canonical_url;

/// Module for authorization event validation and allowlist policy
pub mod auth_validator;

/// Module for signing test authorization events
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
