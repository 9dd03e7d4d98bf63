//! Claim gate for protected paths.
//!
//! Classifies every request with the access policy. When the path needs a
//! claim, decodes the `Authorization: Nostr` header, validates the event
//! against the URL the client actually requested, and injects the verified
//! identity into request extensions.

use crate::auth::{classify, VerifiedIdentity};
use crate::config::Config;
use crate::errors::ProxyError;
use crate::observability::metrics::record_auth_result;
use crate::routes::AppState;
use crate::services::endpoints;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::IntoResponse,
};
use common::auth_event::decode_authorization;
use common::auth_validator::validate;
use common::error::RejectionReason;
use std::sync::Arc;
use tracing::instrument;

/// Header set by reverse proxies to the scheme the client used.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Header set by reverse proxies to the host the client used.
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Claim gate middleware.
///
/// Always stores the [`AccessDecision`](crate::auth::AccessDecision) in
/// request extensions. When the decision requires a claim and the gate is
/// enabled, the request must carry a valid authorization event.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Nostr <base64 JSON event>
/// ```
///
/// # Response
///
/// - Returns 404 Not Found for claim-gated paths outside the endpoint allowlist
/// - Returns 401 Unauthorized with `WWW-Authenticate: Nostr` if the event is missing or invalid
/// - Continues to next handler with [`VerifiedIdentity`] in extensions if the event is valid
#[instrument(skip_all, name = "proxy.middleware.auth")]
pub async fn require_claim(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ProxyError> {
    let decision = classify(req.uri().path());
    req.extensions_mut().insert(decision);

    // Claim-gated paths outside the endpoint allowlist are 404 without a claim check
    if decision.requires_claim && endpoints::lookup(req.uri().path()).is_none() {
        return Err(ProxyError::NotFound(req.uri().path().to_string()));
    }

    if decision.requires_claim && state.config.nostr_auth_enabled {
        let now = chrono::Utc::now().timestamp();

        let identity = authorize(&state.config, &req, now).map_err(|reason| {
            record_auth_result(reason.as_str());
            tracing::debug!(
                target: "proxy.middleware.auth",
                reason = reason.as_str(),
                path = %req.uri().path(),
                "Request rejected"
            );
            ProxyError::Unauthorized(reason)
        })?;

        record_auth_result("accepted");
        tracing::debug!(
            target: "proxy.middleware.auth",
            identity = %identity.short(),
            path = %req.uri().path(),
            "Request authorized"
        );

        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// Decode and validate the request's authorization event.
///
/// # Errors
///
/// The [`RejectionReason`] of the first failed step.
pub fn authorize<B>(
    config: &Config,
    req: &axum::http::Request<B>,
    now_seconds: i64,
) -> Result<VerifiedIdentity, RejectionReason> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(RejectionReason::MissingOrMalformedHeader)?
        .to_str()
        .map_err(|_| RejectionReason::MissingOrMalformedHeader)?;

    let event = decode_authorization(header_value)?;
    let request_url = public_request_url(config, req.headers(), req.uri());

    validate(
        &event,
        &request_url,
        req.method().as_str(),
        now_seconds,
        &config.allowlist,
    )
    .map(VerifiedIdentity)
}

/// Rebuild the absolute URL the client requested.
///
/// Uses `PUBLIC_BASE_URL` when configured. Otherwise trusts
/// `X-Forwarded-Proto` (default `http`) and `X-Forwarded-Host`, falling
/// back to `Host`.
pub fn public_request_url(config: &Config, headers: &HeaderMap, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    if let Some(base) = &config.public_base_url {
        return format!("{base}{path_and_query}");
    }

    let scheme = first_header_value(headers, FORWARDED_PROTO_HEADER).unwrap_or("http");
    let host = first_header_value(headers, FORWARDED_HOST_HEADER)
        .or_else(|| first_header_value(headers, header::HOST.as_str()))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");

    format!("{scheme}://{host}{path_and_query}")
}

/// First comma-separated value of a header, trimmed.
fn first_header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
