//! HTTP authorization events carried in `Authorization: Nostr <base64>` headers.
//!
//! The header payload is a base64-encoded JSON event with the field names
//! fixed by the Nostr protocol:
//!
//! ```json
//! {"id":"..","pubkey":"..","created_at":1700000000,"kind":27235,
//!  "tags":[["u","https://proxy.example/search/byterm?q=x"],["method","GET"]],
//!  "content":"","sig":".."}
//! ```
//!
//! Decoding only checks structure. Whether the event authorizes anything is
//! decided by [`crate::auth_validator::validate`].

use crate::error::RejectionReason;
use base64::{engine::general_purpose::STANDARD, Engine};
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};

/// Event kind reserved for HTTP authorization.
pub const HTTP_AUTH_KIND: u64 = 27235;

/// Maximum accepted `Authorization` header length in bytes (8KB).
///
/// Checked before base64 decoding so oversized headers cost nothing.
pub const MAX_AUTHORIZATION_HEADER_BYTES: usize = 8192;

/// Authorization scheme keyword, matched case-insensitively.
pub const AUTH_SCHEME: &str = "Nostr";

/// Tag carrying the absolute URL the event is bound to.
pub const URL_TAG: &str = "u";

/// Tag carrying the HTTP method the event is bound to.
pub const METHOD_TAG: &str = "method";

/// A decoded authorization event.
///
/// Immutable once decoded; consumed by a single validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Hex SHA-256 of the canonical serialization, as claimed by the signer.
    pub id: String,

    /// Hex x-only public key of the signer (32 bytes).
    pub pubkey: String,

    /// Creation time, Unix epoch seconds.
    pub created_at: i64,

    /// Event kind; must be [`HTTP_AUTH_KIND`] to authorize a request.
    pub kind: u64,

    /// Ordered tags; the first element of each is the tag name.
    pub tags: Vec<Vec<String>>,

    /// Free-form content, normally empty.
    pub content: String,

    /// Hex BIP-340 Schnorr signature over the 32-byte event id.
    pub sig: String,
}

impl AuthEvent {
    /// Value of the first tag named `name`, if it carries a value.
    #[must_use]
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|tag| tag.first().is_some_and(|n| n == name))
            .and_then(|tag| tag.get(1))
            .map(String::as_str)
    }

    /// The URL this event is bound to (`u` tag).
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.tag_value(URL_TAG)
    }

    /// The HTTP method this event is bound to (`method` tag).
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.tag_value(METHOD_TAG)
    }

    /// Canonical serialization signed by the producer.
    ///
    /// Compact JSON array `[0, pubkey, created_at, kind, tags, content]`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCredential` if serialization fails, which cannot
    /// happen for well-typed fields but is not unwrapped.
    pub fn canonical_serialization(&self) -> Result<Vec<u8>, RejectionReason> {
        serde_json::to_vec(&(
            0u8,
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        ))
        .map_err(|e| {
            tracing::debug!(target: "common.auth", error = %e, "Failed to serialize event");
            RejectionReason::MalformedCredential
        })
    }

    /// Recompute the event digest from the event fields.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCredential` if the event cannot be serialized.
    pub fn compute_digest(&self) -> Result<[u8; 32], RejectionReason> {
        let serialized = self.canonical_serialization()?;
        let hashed = digest(&SHA256, &serialized);
        <[u8; 32]>::try_from(hashed.as_ref()).map_err(|_| RejectionReason::MalformedCredential)
    }

    /// Recompute the event id as lower-case hex.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCredential` if the event cannot be serialized.
    pub fn compute_id(&self) -> Result<String, RejectionReason> {
        self.compute_digest().map(hex::encode)
    }

    /// Encode this event as an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCredential` if the event cannot be serialized.
    pub fn to_authorization_header(&self) -> Result<String, RejectionReason> {
        let json = serde_json::to_vec(self).map_err(|_| RejectionReason::MalformedCredential)?;
        Ok(format!("{AUTH_SCHEME} {}", STANDARD.encode(json)))
    }
}

/// Decode an `Authorization` header value into an [`AuthEvent`].
///
/// # Errors
///
/// - `MissingOrMalformedHeader` - the value is not `Nostr <payload>`; the
///   payload is never decoded in this case
/// - `MalformedCredential` - oversized header, invalid base64, invalid JSON,
///   or a missing/mistyped event field
pub fn decode_authorization(header_value: &str) -> Result<AuthEvent, RejectionReason> {
    let (scheme, payload) = header_value
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(RejectionReason::MissingOrMalformedHeader)?;

    if !scheme.eq_ignore_ascii_case(AUTH_SCHEME) {
        tracing::debug!(target: "common.auth", "Authorization scheme is not Nostr");
        return Err(RejectionReason::MissingOrMalformedHeader);
    }

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(RejectionReason::MissingOrMalformedHeader);
    }

    if header_value.len() > MAX_AUTHORIZATION_HEADER_BYTES {
        tracing::debug!(
            target: "common.auth",
            header_size = header_value.len(),
            max_size = MAX_AUTHORIZATION_HEADER_BYTES,
            "Authorization header rejected: size exceeds maximum allowed"
        );
        return Err(RejectionReason::MalformedCredential);
    }

    let json = STANDARD.decode(payload).map_err(|e| {
        tracing::debug!(target: "common.auth", error = %e, "Failed to decode event base64");
        RejectionReason::MalformedCredential
    })?;

    serde_json::from_slice::<AuthEvent>(&json).map_err(|e| {
        tracing::debug!(target: "common.auth", error = %e, "Failed to parse event JSON");
        RejectionReason::MalformedCredential
    })
}
