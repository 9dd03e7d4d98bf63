//! Rejection reasons for HTTP authorization events.

use thiserror::Error;

/// Why an authorization header was rejected.
///
/// Every variant is terminal: retrying with the same credential cannot
/// succeed. Messages are stable and distinct so callers can surface them
/// verbatim in a 401 body without leaking internal detail.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// The `Authorization` header is absent or does not use the `Nostr` scheme.
    #[error("Missing or malformed Authorization header")]
    MissingOrMalformedHeader,

    /// The payload is not base64, not JSON, or lacks a required field.
    #[error("Malformed authorization event")]
    MalformedCredential,

    /// The event kind is not the HTTP authorization kind.
    #[error("Invalid event kind")]
    WrongKind,

    /// The event timestamp is outside the accepted window.
    #[error("Authorization event expired or timestamp out of range")]
    Expired,

    /// The `u` tag does not match the request URL.
    #[error("URL mismatch between authorization event and request")]
    UrlMismatch,

    /// The `method` tag does not match the request method.
    #[error("HTTP method mismatch between authorization event and request")]
    MethodMismatch,

    /// The event `id` is not the digest of the event contents.
    #[error("Event id does not match event contents")]
    DigestMismatch,

    /// The signature does not verify against the event pubkey.
    #[error("Invalid event signature")]
    SignatureInvalid,

    /// The pubkey is valid but not in the configured allowlist.
    #[error("Public key is not authorized to use this service")]
    NotAllowlisted,
}

impl RejectionReason {
    /// Short machine label, used for metrics and log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::MissingOrMalformedHeader => "missing_header",
            RejectionReason::MalformedCredential => "malformed_credential",
            RejectionReason::WrongKind => "wrong_kind",
            RejectionReason::Expired => "expired",
            RejectionReason::UrlMismatch => "url_mismatch",
            RejectionReason::MethodMismatch => "method_mismatch",
            RejectionReason::DigestMismatch => "digest_mismatch",
            RejectionReason::SignatureInvalid => "signature_invalid",
            RejectionReason::NotAllowlisted => "not_allowlisted",
        }
    }
}
