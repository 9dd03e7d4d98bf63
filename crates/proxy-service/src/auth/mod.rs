//! Request authorization for the proxy.
//!
//! Event decoding and signature validation live in `common`; this module
//! decides which requests need them.
//!
//! # Components
//!
//! - `access_policy` - Static path tables deciding claim and credential needs
//! - `identity` - Verified identity stored in request extensions

pub mod access_policy;
pub mod identity;

pub use access_policy::{classify, AccessDecision};
pub use identity::{IdentityExt, VerifiedIdentity};
