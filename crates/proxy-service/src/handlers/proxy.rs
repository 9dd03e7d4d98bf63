//! Forwarding handler for upstream endpoints.
//!
//! Serves as the router fallback: every path the proxy does not answer
//! itself lands here after the claim gate.

use crate::auth::{classify, AccessDecision, IdentityExt, VerifiedIdentity};
use crate::errors::ProxyError;
use crate::routes::AppState;
use crate::services::endpoints;
use crate::services::UpstreamResponse;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

/// Forward an allowlisted GET request to the upstream API.
///
/// # Response
///
/// - 404 if the path is not an allowlisted endpoint
/// - 405 if the method is not GET
/// - 502 if the upstream cannot be reached
/// - Otherwise the upstream status and body, with `Cache-Control` on 2xx
#[instrument(skip_all, name = "proxy.handlers.forward", fields(path = %req.uri().path()))]
pub async fn proxy_request(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Response, ProxyError> {
    // The body is never forwarded; keep only the parts across the upstream call
    let (parts, _body) = req.into_parts();
    let path = parts.uri.path();

    let kind = endpoints::lookup(path).ok_or_else(|| {
        tracing::debug!(target: "proxy.handlers.forward", path = %path, "Endpoint not allowlisted");
        ProxyError::NotFound(path.to_string())
    })?;

    if parts.method != Method::GET {
        return Err(ProxyError::MethodNotAllowed);
    }

    let decision = parts
        .extensions
        .get::<AccessDecision>()
        .copied()
        .unwrap_or_else(|| classify(path));

    tracing::debug!(
        target: "proxy.handlers.forward",
        identity = parts.verified_identity().map(VerifiedIdentity::short),
        with_credentials = decision.requires_upstream_credential,
        "Forwarding request"
    );

    let upstream = state
        .upstream
        .forward(
            kind,
            path,
            parts.uri.query(),
            decision.requires_upstream_credential,
        )
        .await?;

    Ok(into_client_response(
        upstream,
        state.config.cache_max_age_seconds,
    ))
}

/// Convert an upstream response into the response sent to the client.
fn into_client_response(upstream: UpstreamResponse, cache_max_age_seconds: u64) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, upstream.body).into_response();
    let headers = response.headers_mut();

    headers.remove(header::CONTENT_TYPE);
    if let Some(content_type) = upstream
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        headers.insert(header::CONTENT_TYPE, content_type);
    }

    if status.is_success() {
        if let Ok(cache_control) =
            HeaderValue::from_str(&format!("public, max-age={cache_max_age_seconds}"))
        {
            headers.insert(header::CACHE_CONTROL, cache_control);
        }
    }

    response
}
