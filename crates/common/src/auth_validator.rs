//! Validation of HTTP authorization events.
//!
//! # Security
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. Event kind is [`HTTP_AUTH_KIND`]
//! 2. `created_at` is within [`MAX_EVENT_AGE_SECONDS`] of now, in either direction
//! 3. `u` tag matches the request URL after canonicalization
//! 4. `method` tag matches the request method, case-insensitively
//! 5. `id` equals the recomputed digest
//! 6. `sig` is a valid BIP-340 Schnorr signature by `pubkey` over the digest
//! 7. `pubkey` is allowlisted when the policy is restricted
//!
//! The current time and the allowlist are parameters so the function is
//! deterministic and has no dependency on process globals.

use crate::auth_event::{AuthEvent, HTTP_AUTH_KIND};
use crate::canonical_url::canonicalize;
use crate::error::RejectionReason;
use k256::schnorr::signature::hazmat::PrehashVerifier;
use k256::schnorr::{Signature, VerifyingKey};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum distance between `created_at` and now, in seconds.
///
/// The window is symmetric: events from the future are held to the same
/// bound as events from the past.
pub const MAX_EVENT_AGE_SECONDS: u64 = 60;

/// Length of a hex-encoded x-only public key.
pub const IDENTITY_HEX_LEN: usize = 64;

/// Allowlist operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Any correctly signed event is accepted.
    #[default]
    Open,
    /// Only allowlisted identities are accepted.
    Restricted,
}

impl AuthMode {
    /// Returns the string representation of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Open => "open",
            AuthMode::Restricted => "restricted",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an auth mode string is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown auth mode '{0}', expected one of: open, whitelist, restricted")]
pub struct ParseAuthModeError(pub String);

impl FromStr for AuthMode {
    type Err = ParseAuthModeError;

    /// Parses `open`, `whitelist` or `restricted`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AuthMode::Open),
            "whitelist" | "restricted" => Ok(AuthMode::Restricted),
            _ => Err(ParseAuthModeError(s.to_string())),
        }
    }
}

/// Identity allowlist, loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AllowlistConfig {
    mode: AuthMode,
    allowed_identities: HashSet<String>,
}

impl AllowlistConfig {
    /// Accept any correctly signed event.
    #[must_use]
    pub fn open() -> Self {
        Self::default()
    }

    /// Accept only the given identities. Entries are trimmed and
    /// lower-cased; empty entries are skipped.
    #[must_use]
    pub fn restricted<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_identities = identities
            .into_iter()
            .map(|id| id.as_ref().trim().to_ascii_lowercase())
            .filter(|id| !id.is_empty())
            .collect();

        Self {
            mode: AuthMode::Restricted,
            allowed_identities,
        }
    }

    /// The operating mode.
    #[must_use]
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// The lower-cased allowlist (empty in open mode).
    #[must_use]
    pub fn allowed_identities(&self) -> &HashSet<String> {
        &self.allowed_identities
    }

    /// Whether `identity` passes the allowlist step.
    #[must_use]
    pub fn permits(&self, identity: &str) -> bool {
        match self.mode {
            AuthMode::Open => true,
            AuthMode::Restricted => self
                .allowed_identities
                .contains(&identity.to_ascii_lowercase()),
        }
    }
}

/// Whether `value` looks like a hex x-only public key.
#[must_use]
pub fn is_identity_hex(value: &str) -> bool {
    value.len() == IDENTITY_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Validate an authorization event against the request it arrived with.
///
/// # Arguments
///
/// * `event` - The decoded event
/// * `request_url` - Absolute URL of the incoming request, as the client saw it
/// * `request_method` - HTTP method of the incoming request
/// * `now_seconds` - Current Unix time, supplied by the caller
/// * `policy` - Allowlist to enforce
///
/// # Returns
///
/// The verified identity (the event `pubkey`, as sent).
///
/// # Errors
///
/// The first failing check's [`RejectionReason`], in the order listed in
/// the module documentation.
pub fn validate(
    event: &AuthEvent,
    request_url: &str,
    request_method: &str,
    now_seconds: i64,
    policy: &AllowlistConfig,
) -> Result<String, RejectionReason> {
    if event.kind != HTTP_AUTH_KIND {
        tracing::debug!(target: "common.auth", kind = event.kind, "Event rejected: wrong kind");
        return Err(RejectionReason::WrongKind);
    }

    let age = now_seconds.abs_diff(event.created_at);
    if age > MAX_EVENT_AGE_SECONDS {
        tracing::debug!(
            target: "common.auth",
            created_at = event.created_at,
            now = now_seconds,
            "Event rejected: timestamp outside window"
        );
        return Err(RejectionReason::Expired);
    }

    let signed_url = event.url().ok_or(RejectionReason::UrlMismatch)?;
    if canonicalize(signed_url) != canonicalize(request_url) {
        tracing::debug!(
            target: "common.auth",
            signed_url = %signed_url,
            request_url = %request_url,
            "Event rejected: URL mismatch"
        );
        return Err(RejectionReason::UrlMismatch);
    }

    let signed_method = event.method().ok_or(RejectionReason::MethodMismatch)?;
    if !signed_method.eq_ignore_ascii_case(request_method) {
        tracing::debug!(
            target: "common.auth",
            signed_method = %signed_method,
            request_method = %request_method,
            "Event rejected: method mismatch"
        );
        return Err(RejectionReason::MethodMismatch);
    }

    let digest = event.compute_digest()?;
    if hex::encode(digest) != event.id {
        tracing::debug!(target: "common.auth", "Event rejected: id does not match contents");
        return Err(RejectionReason::DigestMismatch);
    }

    verify_signature(&event.pubkey, &event.sig, &digest)?;

    if !policy.permits(&event.pubkey) {
        tracing::debug!(target: "common.auth", "Event rejected: identity not allowlisted");
        return Err(RejectionReason::NotAllowlisted);
    }

    Ok(event.pubkey.clone())
}

/// Length of an x-only public key.
const PUBKEY_BYTES: usize = 32;

/// Length of a BIP-340 signature.
const SIGNATURE_BYTES: usize = 64;

/// Verify a BIP-340 signature over a 32-byte digest.
fn verify_signature(
    pubkey_hex: &str,
    sig_hex: &str,
    digest: &[u8; 32],
) -> Result<(), RejectionReason> {
    let pubkey_bytes: [u8; PUBKEY_BYTES] = decode_fixed_hex(pubkey_hex).ok_or_else(|| {
        tracing::debug!(target: "common.auth", "Pubkey is not 32 bytes of hex");
        RejectionReason::SignatureInvalid
    })?;
    let verifying_key = VerifyingKey::from_bytes(pubkey_bytes.as_slice()).map_err(|_| {
        tracing::debug!(target: "common.auth", "Pubkey is not a valid x-only point");
        RejectionReason::SignatureInvalid
    })?;

    // k256 splits the slice without a length check, so the size is fixed first
    let sig_bytes: [u8; SIGNATURE_BYTES] = decode_fixed_hex(sig_hex).ok_or_else(|| {
        tracing::debug!(target: "common.auth", "Signature is not 64 bytes of hex");
        RejectionReason::SignatureInvalid
    })?;
    let signature = Signature::try_from(sig_bytes.as_slice()).map_err(|_| {
        tracing::debug!(target: "common.auth", "Malformed signature bytes");
        RejectionReason::SignatureInvalid
    })?;

    verifying_key.verify_prehash(digest, &signature).map_err(|_| {
        tracing::debug!(target: "common.auth", "Signature verification failed");
        RejectionReason::SignatureInvalid
    })
}

/// Decode hex into exactly `N` bytes.
fn decode_fixed_hex<const N: usize>(value: &str) -> Option<[u8; N]> {
    hex::decode(value).ok()?.try_into().ok()
}
