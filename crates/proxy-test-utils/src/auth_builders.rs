//! Builder patterns for authorization headers
//!
//! Provides a fluent API for creating `Authorization: Nostr` values,
//! including deliberately broken ones.

use chrono::Utc;
use common::auth_event::{AuthEvent, HTTP_AUTH_KIND, METHOD_TAG, URL_TAG};
use common::testing::TestSigner;

/// Builder for `Authorization` header values
///
/// # Example
/// ```rust,ignore
/// let header = AuthHeaderBuilder::new(7)
///     .for_url("http://127.0.0.1:8080/search/byterm?q=rust")
///     .aged(30)
///     .build();
/// ```
pub struct AuthHeaderBuilder {
    signer: TestSigner,
    url: String,
    method: String,
    created_at: i64,
    kind: u64,
    tamper_content: bool,
    claimed_pubkey: Option<String>,
    signature: Option<String>,
}

impl AuthHeaderBuilder {
    /// Create a builder that signs with the key derived from `seed`
    pub fn new(seed: u8) -> Self {
        Self {
            signer: TestSigner::from_seed(seed),
            url: "http://localhost/".to_string(),
            method: "GET".to_string(),
            created_at: Utc::now().timestamp(),
            kind: HTTP_AUTH_KIND,
            tamper_content: false,
            claimed_pubkey: None,
            signature: None,
        }
    }

    /// Hex pubkey of the signing key
    pub fn pubkey_hex(&self) -> String {
        self.signer.pubkey_hex()
    }

    /// Set the `u` tag
    pub fn for_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Set the `method` tag
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    /// Set `created_at` to `seconds` in the past (negative for the future)
    pub fn aged(mut self, seconds: i64) -> Self {
        self.created_at = Utc::now().timestamp() - seconds;
        self
    }

    /// Set the event kind
    pub fn with_kind(mut self, kind: u64) -> Self {
        self.kind = kind;
        self
    }

    /// Change the content after signing so the id no longer matches
    pub fn tampered(mut self) -> Self {
        self.tamper_content = true;
        self
    }

    /// Claim a different pubkey than the one that signs. Ignores `with_kind`.
    pub fn claiming_pubkey(mut self, pubkey_hex: &str) -> Self {
        self.claimed_pubkey = Some(pubkey_hex.to_string());
        self
    }

    /// Replace the signature with `sig_hex` after signing
    pub fn with_signature(mut self, sig_hex: &str) -> Self {
        self.signature = Some(sig_hex.to_string());
        self
    }

    /// Build the signed event
    pub fn build_event(self) -> AuthEvent {
        let mut event = match self.claimed_pubkey {
            Some(pubkey) => {
                self.signer
                    .sign_event_as(pubkey, &self.url, &self.method, self.created_at)
            }
            None => self.signer.sign_event(
                self.kind,
                self.created_at,
                vec![
                    vec![URL_TAG.to_string(), self.url.clone()],
                    vec![METHOD_TAG.to_string(), self.method.clone()],
                ],
                "",
            ),
        };

        if self.tamper_content {
            event.content = "tampered".to_string();
        }
        if let Some(sig) = self.signature {
            event.sig = sig;
        }
        event
    }

    /// Build the `Authorization` header value
    pub fn build(self) -> String {
        self.build_event()
            .to_authorization_header()
            .expect("test event serializes")
    }
}
