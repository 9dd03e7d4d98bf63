//! Secret types for protecting upstream credentials from accidental logging.
//!
//! Re-exports [`secrecy`] and defines [`UpstreamCredentials`], the key pair
//! the proxy injects into upstream requests. `SecretString` implements
//! `Debug` with redaction, so any struct deriving `Debug` that holds one
//! is safe to log.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString, UpstreamCredentials};
//!
//! let creds = UpstreamCredentials::new("KEY".to_string(), SecretString::from("SECRET"));
//!
//! // The secret never shows up in debug output
//! assert!(!format!("{creds:?}").contains("SECRET"));
//!
//! // Access requires an explicit call
//! assert_eq!(creds.api_secret().expose_secret(), "SECRET");
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretString};

/// API key and secret for the upstream podcast API.
///
/// The key is sent in clear as `X-Auth-Key`; the secret only ever leaves
/// the process folded into a hash.
#[derive(Debug, Clone)]
pub struct UpstreamCredentials {
    api_key: String,
    api_secret: SecretString,
}

impl UpstreamCredentials {
    /// Create credentials from a key and secret.
    #[must_use]
    pub fn new(api_key: String, api_secret: SecretString) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }

    /// The public API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The API secret.
    #[must_use]
    pub fn api_secret(&self) -> &SecretString {
        &self.api_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_upstream_credentials_debug_hides_secret() {
        let creds = UpstreamCredentials::new(
            "visible-key".to_string(),
            SecretString::from("very-private-secret"),
        );

        let debug_str = format!("{creds:?}");

        assert!(debug_str.contains("visible-key"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("very-private-secret"));
    }

    #[test]
    fn test_upstream_credentials_accessors() {
        let creds = UpstreamCredentials::new("k".to_string(), SecretString::from("s"));
        assert_eq!(creds.api_key(), "k");
        assert_eq!(creds.api_secret().expose_secret(), "s");
    }

    #[test]
    fn test_deserialize_secret_field() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct RawCredentials {
            key: String,
            secret: SecretString,
        }

        let json = r#"{"key": "abc", "secret": "my-secret-value"}"#;
        let creds: RawCredentials = serde_json::from_str(json).expect("deserialize");

        assert_eq!(creds.secret.expose_secret(), "my-secret-value");

        let debug = format!("{creds:?}");
        assert!(!debug.contains("my-secret-value"));
    }

    #[test]
    fn test_clone_keeps_secret() {
        let creds = UpstreamCredentials::new("k".to_string(), SecretString::from("cloneable"));
        let cloned = creds.clone();
        assert_eq!(cloned.api_secret().expose_secret(), "cloneable");
    }
}
