//! Proxy error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl.
//! Upstream and internal failures return generic messages to clients; the
//! actual errors are logged server-side where they occur.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::auth_event::AUTH_SCHEME;
use common::error::RejectionReason;
use serde::Serialize;
use thiserror::Error;

/// Hint returned with every 401 so clients know what the proxy expects.
pub const UNAUTHORIZED_HINT: &str =
    "Sign a kind 27235 event bound to this URL and method and send it as 'Authorization: Nostr <base64 event>'";

/// Proxy error type.
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - NotFound: 404 Not Found
/// - MethodNotAllowed: 405 Method Not Allowed
/// - BadGateway: 502 Bad Gateway
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Unauthorized: {0}")]
    Unauthorized(RejectionReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal server error")]
    Internal,
}

impl ProxyError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::Unauthorized(_) => 401,
            ProxyError::NotFound(_) => 404,
            ProxyError::MethodNotAllowed => 405,
            ProxyError::BadGateway(_) => 502,
            ProxyError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error, details, hint) = match &self {
            ProxyError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                reason.to_string(),
                Some(UNAUTHORIZED_HINT),
            ),
            ProxyError::NotFound(path) => (
                StatusCode::NOT_FOUND,
                "Not Found",
                format!("Endpoint {path} is not supported by this proxy"),
                None,
            ),
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed",
                "Only GET requests are proxied".to_string(),
                None,
            ),
            ProxyError::BadGateway(_) => (
                StatusCode::BAD_GATEWAY,
                "Bad Gateway",
                "The upstream API could not be reached".to_string(),
                None,
            ),
            ProxyError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error,
            details,
            hint,
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(AUTH_SCHEME),
            );
        }

        response
    }
}
