//! Signing helpers for tests.
//!
//! Only compiled with `cfg(test)` or the `test-utils` feature. Keys are
//! derived deterministically from a one-byte seed so test failures are
//! reproducible.
//!
//! ```rust,ignore
//! use common::testing::TestSigner;
//!
//! let signer = TestSigner::from_seed(1);
//! let header = signer.authorization_header("http://127.0.0.1:8080/recent/feeds", "GET", now);
//! ```

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use crate::auth_event::{AuthEvent, HTTP_AUTH_KIND, METHOD_TAG, URL_TAG};
use k256::schnorr::signature::hazmat::PrehashSigner;
use k256::schnorr::SigningKey;

/// Deterministic Schnorr keypair that produces signed authorization events.
pub struct TestSigner {
    signing_key: SigningKey,
}

impl TestSigner {
    /// Derive a keypair from `seed`. Distinct seeds give distinct keys.
    #[must_use]
    pub fn from_seed(seed: u8) -> Self {
        let mut secret = [0u8; 32];
        // Keep the leading byte small so the scalar is always below the curve order
        secret[0] = seed & 0x7f;
        for (i, byte) in secret.iter_mut().enumerate().skip(1) {
            *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
        }
        secret[31] ^= seed;

        let signing_key = SigningKey::from_bytes(&secret).expect("valid test secret key");
        Self { signing_key }
    }

    /// Hex x-only public key.
    #[must_use]
    pub fn pubkey_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an arbitrary event.
    #[must_use]
    pub fn sign_event(
        &self,
        kind: u64,
        created_at: i64,
        tags: Vec<Vec<String>>,
        content: &str,
    ) -> AuthEvent {
        self.sign_with_pubkey(self.pubkey_hex(), kind, created_at, tags, content)
    }

    /// Sign an HTTP authorization event bound to `url` and `method`.
    #[must_use]
    pub fn sign_request(&self, url: &str, method: &str, created_at: i64) -> AuthEvent {
        self.sign_event(HTTP_AUTH_KIND, created_at, request_tags(url, method), "")
    }

    /// Sign an HTTP authorization event but claim a different `pubkey`.
    ///
    /// The `id` is computed over the claimed pubkey, so only signature
    /// verification can catch the substitution.
    #[must_use]
    pub fn sign_event_as(
        &self,
        claimed_pubkey: String,
        url: &str,
        method: &str,
        created_at: i64,
    ) -> AuthEvent {
        self.sign_with_pubkey(
            claimed_pubkey,
            HTTP_AUTH_KIND,
            created_at,
            request_tags(url, method),
            "",
        )
    }

    /// `Authorization` header value for a request.
    #[must_use]
    pub fn authorization_header(&self, url: &str, method: &str, created_at: i64) -> String {
        self.sign_request(url, method, created_at)
            .to_authorization_header()
            .expect("test event serializes")
    }

    fn sign_with_pubkey(
        &self,
        pubkey: String,
        kind: u64,
        created_at: i64,
        tags: Vec<Vec<String>>,
        content: &str,
    ) -> AuthEvent {
        let mut event = AuthEvent {
            id: String::new(),
            pubkey,
            created_at,
            kind,
            tags,
            content: content.to_string(),
            sig: String::new(),
        };

        let digest = event.compute_digest().expect("test event serializes");
        let signature = self
            .signing_key
            .sign_prehash(&digest)
            .expect("schnorr signing succeeds");

        event.id = hex::encode(digest);
        event.sig = hex::encode(signature.to_bytes());
        event
    }
}

fn request_tags(url: &str, method: &str) -> Vec<Vec<String>> {
    vec![
        vec![URL_TAG.to_string(), url.to_string()],
        vec![METHOD_TAG.to_string(), method.to_string()],
    ]
}
