//! Proxy configuration.
//!
//! Configuration is loaded from environment variables. The upstream API
//! secret is held in a `SecretString` and redacted in Debug output.

use common::auth_validator::{is_identity_hex, AllowlistConfig, AuthMode};
use common::secret::{SecretString, UpstreamCredentials};
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default upstream API origin.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.podcastindex.org";

/// Default upstream request timeout in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 10;

/// Maximum upstream request timeout in seconds.
pub const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 120;

/// Default `Cache-Control` max-age for successful upstream responses.
pub const DEFAULT_CACHE_MAX_AGE_SECONDS: u64 = 300;

/// Proxy configuration.
///
/// Loaded once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Upstream API key and secret.
    pub credentials: UpstreamCredentials,

    /// Upstream API origin, without a trailing slash.
    pub upstream_base_url: String,

    /// `User-Agent` sent on every upstream request.
    pub upstream_user_agent: String,

    /// Upstream request timeout in seconds.
    pub upstream_timeout_seconds: u64,

    /// `Cache-Control` max-age added to successful responses.
    pub cache_max_age_seconds: u64,

    /// Whether claim-gated paths actually check the `Authorization` header.
    pub nostr_auth_enabled: bool,

    /// Identity allowlist applied after signature verification.
    pub allowlist: AllowlistConfig,

    /// Externally visible origin used to rebuild the request URL, if the
    /// proxy sits behind something that rewrites `Host`.
    pub public_base_url: Option<String>,

    /// Directory served under `/static/`.
    pub static_dir: Option<String>,
}

/// Custom Debug implementation that keeps the allowlist out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("credentials", &self.credentials)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_user_agent", &self.upstream_user_agent)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("cache_max_age_seconds", &self.cache_max_age_seconds)
            .field("nostr_auth_enabled", &self.nostr_auth_enabled)
            .field("auth_mode", &self.allowlist.mode())
            .field(
                "allowlist_size",
                &self.allowlist.allowed_identities().len(),
            )
            .field("public_base_url", &self.public_base_url)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid upstream configuration: {0}")]
    InvalidUpstream(String),

    #[error("Invalid cache configuration: {0}")]
    InvalidCache(String),

    #[error("Invalid auth configuration: {0}")]
    InvalidAuth(String),

    #[error("Invalid public base URL: {0}")]
    InvalidPublicBaseUrl(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = required(vars, "PODCASTINDEX_API_KEY")?;
        let api_secret = required(vars, "PODCASTINDEX_API_SECRET")?;
        let credentials = UpstreamCredentials::new(api_key, SecretString::from(api_secret));

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let upstream_base_url = match vars.get("PODCASTINDEX_BASE_URL") {
            Some(value) => parse_http_origin(value).map_err(|msg| {
                ConfigError::InvalidUpstream(format!("PODCASTINDEX_BASE_URL {msg}"))
            })?,
            None => DEFAULT_UPSTREAM_BASE_URL.to_string(),
        };

        let upstream_user_agent = vars
            .get("UPSTREAM_USER_AGENT")
            .filter(|ua| !ua.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("podcast-proxy/{}", env!("CARGO_PKG_VERSION")));

        // Parse upstream timeout with validation
        let upstream_timeout_seconds = if let Some(value_str) = vars.get("UPSTREAM_TIMEOUT_SECONDS")
        {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidUpstream(format!(
                    "UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidUpstream(
                    "UPSTREAM_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            if value > MAX_UPSTREAM_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidUpstream(format!(
                    "UPSTREAM_TIMEOUT_SECONDS must not exceed {MAX_UPSTREAM_TIMEOUT_SECONDS} seconds, got {value}"
                )));
            }

            value
        } else {
            DEFAULT_UPSTREAM_TIMEOUT_SECONDS
        };

        let cache_max_age_seconds = if let Some(value_str) = vars.get("CACHE_MAX_AGE_SECONDS") {
            value_str.parse().map_err(|e| {
                ConfigError::InvalidCache(format!(
                    "CACHE_MAX_AGE_SECONDS must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?
        } else {
            DEFAULT_CACHE_MAX_AGE_SECONDS
        };

        let nostr_auth_enabled = match vars.get("NOSTR_AUTH_ENABLED") {
            Some(value) => parse_bool(value).ok_or_else(|| {
                ConfigError::InvalidAuth(format!(
                    "NOSTR_AUTH_ENABLED must be true, false, 1 or 0, got '{value}'"
                ))
            })?,
            None => true,
        };

        let mode: AuthMode = match vars.get("AUTH_MODE") {
            Some(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidAuth(format!("AUTH_MODE: {e}")))?,
            None => AuthMode::Open,
        };

        let allowlist = match mode {
            AuthMode::Open => AllowlistConfig::open(),
            AuthMode::Restricted => {
                let raw = vars.get("AUTH_WHITELIST").map_or("", String::as_str);
                parse_allowlist(raw)?
            }
        };

        let public_base_url = match vars.get("PUBLIC_BASE_URL") {
            Some(value) if !value.trim().is_empty() => Some(
                parse_http_origin(value).map_err(|msg| {
                    ConfigError::InvalidPublicBaseUrl(format!("PUBLIC_BASE_URL {msg}"))
                })?,
            ),
            _ => None,
        };

        let static_dir = vars
            .get("STATIC_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .cloned();

        Ok(Config {
            bind_address,
            credentials,
            upstream_base_url,
            upstream_user_agent,
            upstream_timeout_seconds,
            cache_max_age_seconds,
            nostr_auth_enabled,
            allowlist,
            public_base_url,
            static_dir,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Validate an http(s) URL and return it without a trailing slash.
fn parse_http_origin(value: &str) -> Result<String, String> {
    let trimmed = value.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).map_err(|e| format!("must be a valid URL: {e}"))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("must use http or https, got '{}'", parsed.scheme()));
    }

    Ok(trimmed.to_string())
}

/// Parse a comma-separated list of hex public keys.
///
/// An empty list is rejected: restricted mode would then refuse everyone.
fn parse_allowlist(raw: &str) -> Result<AllowlistConfig, ConfigError> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();

    if entries.is_empty() {
        return Err(ConfigError::InvalidAuth(
            "AUTH_WHITELIST must list at least one public key when AUTH_MODE is restricted"
                .to_string(),
        ));
    }

    if let Some(bad) = entries.iter().find(|entry| !is_identity_hex(entry)) {
        return Err(ConfigError::InvalidAuth(format!(
            "AUTH_WHITELIST entries must be 64 hex characters, got '{bad}'"
        )));
    }

    Ok(AllowlistConfig::restricted(entries))
}
