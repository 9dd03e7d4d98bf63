//! Path classification for the claim gate.
//!
//! Decides, from the literal request path alone, whether a request must
//! carry a signed authorization event and whether the upstream call needs
//! the proxy's API credentials. Rules are checked in order:
//!
//! 1. [`OPEN_PATHS`] and [`OPEN_PREFIXES`] need neither
//! 2. [`CLAIM_REQUIRED_PREFIXES`] need both, even though they also match
//!    the next table
//! 3. [`UNCREDENTIALED_PREFIXES`] need neither
//! 4. Everything else needs both

/// Paths served by the proxy itself.
pub const OPEN_PATHS: &[&str] = &["/", "/health"];

/// Prefixes served by the proxy itself.
pub const OPEN_PREFIXES: &[&str] = &["/static/"];

/// Search endpoints that always require a claim.
pub const CLAIM_REQUIRED_PREFIXES: &[&str] = &[
    "/search/byterm",
    "/search/bytitle",
    "/search/byperson",
    "/search/music/byterm",
];

/// Prefixes the upstream serves without authentication.
pub const UNCREDENTIALED_PREFIXES: &[&str] = &["/search", "/lookup", "/value/", "/hub/", "/static/"];

/// What a request needs before it can be forwarded.
///
/// Stored in request extensions by the claim gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    /// The request must carry a valid `Authorization: Nostr` header.
    pub requires_claim: bool,

    /// The upstream request must carry the proxy's API credentials.
    pub requires_upstream_credential: bool,
}

impl AccessDecision {
    const OPEN: Self = Self {
        requires_claim: false,
        requires_upstream_credential: false,
    };

    const PROTECTED: Self = Self {
        requires_claim: true,
        requires_upstream_credential: true,
    };
}

/// Classify a request path.
///
/// Pure function of the path string: no normalization, no I/O.
pub fn classify(path: &str) -> AccessDecision {
    if OPEN_PATHS.contains(&path) || has_any_prefix(path, OPEN_PREFIXES) {
        return AccessDecision::OPEN;
    }

    if has_any_prefix(path, CLAIM_REQUIRED_PREFIXES) {
        return AccessDecision::PROTECTED;
    }

    if has_any_prefix(path, UNCREDENTIALED_PREFIXES) {
        return AccessDecision::OPEN;
    }

    AccessDecision::PROTECTED
}

fn has_any_prefix(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}
