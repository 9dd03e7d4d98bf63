//! HTTP client for the upstream podcast API.
//!
//! # Security
//!
//! - The API secret never leaves the process; only `sha1(key + secret + date)` is sent
//! - Credentials are attached only when the access policy asks for them
//! - Timeouts prevent hanging connections
//! - Transport errors are logged server-side with generic messages returned

use crate::config::Config;
use crate::errors::ProxyError;
use crate::observability::metrics::record_upstream_request;
use crate::services::endpoints::{self, EndpointKind};
use axum::body::Bytes;
use common::secret::{ExposeSecret, UpstreamCredentials};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use std::time::{Duration, Instant};
use tracing::{error, instrument, warn};

/// Connect timeout for upstream requests in seconds.
const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Header carrying the API key.
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";

/// Header carrying the Unix time the credential hash was computed at.
pub const AUTH_DATE_HEADER: &str = "X-Auth-Date";

/// Credential headers for one upstream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialHeaders {
    /// `X-Auth-Key` value.
    pub auth_key: String,

    /// `X-Auth-Date` value, Unix seconds.
    pub auth_date: String,

    /// `Authorization` value, lower-case hex SHA-1.
    pub authorization: String,
}

impl CredentialHeaders {
    /// Compute credential headers for `now_seconds`.
    pub fn new(credentials: &UpstreamCredentials, now_seconds: i64) -> Self {
        let auth_date = now_seconds.to_string();
        let authorization = credential_hash(
            credentials.api_key(),
            credentials.api_secret().expose_secret(),
            &auth_date,
        );

        Self {
            auth_key: credentials.api_key().to_string(),
            auth_date,
            authorization,
        }
    }
}

/// `hex(sha1(key + secret + date))`.
pub fn credential_hash(api_key: &str, api_secret: &str, auth_date: &str) -> String {
    let mut input = String::with_capacity(api_key.len() + api_secret.len() + auth_date.len());
    input.push_str(api_key);
    input.push_str(api_secret);
    input.push_str(auth_date);

    hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, input.as_bytes()))
}

/// Upstream response passed back to the client.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Upstream HTTP status.
    pub status: u16,

    /// Upstream `Content-Type`, if any.
    pub content_type: Option<String>,

    /// Full response body.
    pub body: Bytes,
}

/// HTTP client for the upstream API.
#[derive(Clone)]
pub struct UpstreamClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Upstream origin, without a trailing slash.
    base_url: String,

    /// `User-Agent` sent on every request.
    user_agent: String,

    /// API key and secret.
    credentials: UpstreamCredentials,
}

impl UpstreamClient {
    /// Create a new upstream client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Internal` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_seconds))
            .connect_timeout(Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                error!(target: "proxy.services.upstream", error = %e, "Failed to build HTTP client");
                ProxyError::Internal
            })?;

        Ok(Self {
            client,
            base_url: config.upstream_base_url.clone(),
            user_agent: config.upstream_user_agent.clone(),
            credentials: config.credentials.clone(),
        })
    }

    /// The upstream origin this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward a GET request upstream.
    ///
    /// # Arguments
    ///
    /// * `kind` - Where the endpoint lives upstream
    /// * `path` - Request path as received, e.g. `/search/byterm`
    /// * `query` - Raw query string, forwarded unchanged
    /// * `with_credentials` - Attach the API credential headers
    ///
    /// # Errors
    ///
    /// - `ProxyError::BadGateway` if the upstream is unreachable, times out,
    ///   or the body cannot be read
    #[instrument(skip(self, query), name = "proxy.upstream.forward")]
    pub async fn forward(
        &self,
        kind: EndpointKind,
        path: &str,
        query: Option<&str>,
        with_credentials: bool,
    ) -> Result<UpstreamResponse, ProxyError> {
        let url = endpoints::upstream_url(&self.base_url, kind, path, query);
        let start = Instant::now();

        let mut request = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json");

        if with_credentials {
            let headers = CredentialHeaders::new(&self.credentials, chrono::Utc::now().timestamp());
            request = request
                .header(AUTH_KEY_HEADER, headers.auth_key)
                .header(AUTH_DATE_HEADER, headers.auth_date)
                .header(AUTHORIZATION, headers.authorization);
        }

        let response = request.send().await.map_err(|e| {
            let outcome = if e.is_timeout() { "timeout" } else { "error" };
            record_upstream_request(outcome, start.elapsed());
            warn!(target: "proxy.services.upstream", error = %e, path = %path, "Upstream request failed");
            ProxyError::BadGateway(e.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| {
            record_upstream_request("error", start.elapsed());
            warn!(target: "proxy.services.upstream", error = %e, path = %path, "Failed to read upstream body");
            ProxyError::BadGateway(e.to_string())
        })?;

        record_upstream_request(status_label(status), start.elapsed());

        if status >= 500 {
            warn!(target: "proxy.services.upstream", status, path = %path, "Upstream returned server error");
        } else {
            tracing::debug!(target: "proxy.services.upstream", status, path = %path, "Upstream responded");
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Bounded label for an upstream HTTP status.
fn status_label(status: u16) -> &'static str {
    match status {
        200..=299 => "success",
        400..=499 => "client_error",
        500..=599 => "server_error",
        _ => "other",
    }
}
