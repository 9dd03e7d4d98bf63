//! Verified identity attached to authorized requests.

use std::fmt;

/// Hex public key that signed the request's authorization event.
///
/// Inserted into request extensions by the claim gate after a successful
/// validation. Absent on paths that need no claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity(pub String);

impl VerifiedIdentity {
    /// The full hex public key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for log fields.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extension trait for reading the verified identity from a request.
pub trait IdentityExt {
    /// The verified identity, or `None` if the request carried no claim.
    fn verified_identity(&self) -> Option<&VerifiedIdentity>;
}

impl<B> IdentityExt for axum::extract::Request<B> {
    fn verified_identity(&self) -> Option<&VerifiedIdentity> {
        self.extensions().get::<VerifiedIdentity>()
    }
}

impl IdentityExt for axum::http::request::Parts {
    fn verified_identity(&self) -> Option<&VerifiedIdentity> {
        self.extensions.get::<VerifiedIdentity>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_short_truncates() {
        let identity = VerifiedIdentity("abcdef0123456789".to_string());
        assert_eq!(identity.short(), "abcdef01");
        assert_eq!(identity.as_str(), "abcdef0123456789");
    }

    #[test]
    fn test_short_keeps_short_values() {
        let identity = VerifiedIdentity("abc".to_string());
        assert_eq!(identity.short(), "abc");
    }

    #[test]
    fn test_request_extension_lookup() {
        let mut req = axum::extract::Request::new(Body::empty());
        assert!(req.verified_identity().is_none());

        req.extensions_mut()
            .insert(VerifiedIdentity("ff".repeat(32)));
        assert_eq!(req.verified_identity().unwrap().as_str(), "ff".repeat(32));

        let (parts, _) = req.into_parts();
        assert_eq!(parts.verified_identity().unwrap().short(), "ffffffff");
    }
}
