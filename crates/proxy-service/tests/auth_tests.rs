//! Claim gate integration tests.
//!
//! Signs `Authorization: Nostr` events against a live proxy and checks which
//! requests reach the mocked upstream.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proxy_test_utils::{AuthHeaderBuilder, TestProxyServer};
use reqwest::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/search/byterm?q=bitcoin";

/// Upstream that answers every search with an empty result.
async fn search_upstream() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/search/byterm"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"feeds":[]}"#, "application/json"))
        .mount(&upstream)
        .await;
    upstream
}

async fn get_with_header(
    url: &str,
    authorization: Option<String>,
) -> Result<reqwest::Response, anyhow::Error> {
    let mut request = reqwest::Client::new().get(url);
    if let Some(value) = authorization {
        request = request.header("Authorization", value);
    }
    Ok(request.send().await?)
}

/// Assert a 401 carrying the challenge header and the expected reason text.
async fn assert_rejected(response: reqwest::Response, reason_fragment: &str) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok()),
        Some("Nostr")
    );

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
    let details = body["details"].as_str().unwrap_or_default();
    assert!(
        details.contains(reason_fragment),
        "Expected details to contain {reason_fragment:?}, got {details:?}"
    );
    assert!(body["hint"].is_string());
}

/// A valid event in open mode reaches the upstream.
#[tokio::test]
async fn test_valid_event_in_open_mode_is_forwarded() -> Result<(), anyhow::Error> {
    let upstream = search_upstream().await;
    let server = TestProxyServer::spawn(&upstream.uri()).await?;

    let header = AuthHeaderBuilder::new(1)
        .for_url(&server.url_for(SEARCH_PATH))
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert!(body["feeds"].is_array());

    Ok(())
}

/// A protected request without a header never reaches the upstream.
#[tokio::test]
async fn test_missing_header_is_rejected() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let server = TestProxyServer::spawn(&upstream.uri()).await?;

    let response = get_with_header(&server.url_for(SEARCH_PATH), None).await?;

    assert_rejected(response, "Missing or malformed Authorization header").await;

    Ok(())
}

/// A header without the `Nostr` scheme is rejected.
#[tokio::test]
async fn test_wrong_scheme_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(2)
        .for_url(&server.url_for(SEARCH_PATH))
        .build()
        .replacen("Nostr ", "Bearer ", 1);

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "Missing or malformed Authorization header").await;

    Ok(())
}

/// Garbage after the scheme is a malformed credential.
#[tokio::test]
async fn test_undecodable_payload_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let response = get_with_header(
        &server.url_for(SEARCH_PATH),
        Some("Nostr !!!not-base64!!!".to_string()),
    )
    .await?;

    assert_rejected(response, "Malformed authorization event").await;

    Ok(())
}

/// Query parameter order does not matter for URL binding.
#[tokio::test]
async fn test_parameter_order_is_irrelevant() -> Result<(), anyhow::Error> {
    let upstream = search_upstream().await;
    let server = TestProxyServer::spawn(&upstream.uri()).await?;

    let header = AuthHeaderBuilder::new(3)
        .for_url(&server.url_for("/search/byterm?q=bitcoin&max=10"))
        .build();

    let response = get_with_header(
        &server.url_for("/search/byterm?max=10&q=bitcoin"),
        Some(header),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// An event bound to a different query is rejected.
#[tokio::test]
async fn test_url_mismatch_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(4)
        .for_url(&server.url_for("/search/byterm?q=other"))
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "URL mismatch").await;

    Ok(())
}

/// An event signed for another method is rejected.
#[tokio::test]
async fn test_method_mismatch_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(5)
        .for_url(&server.url_for(SEARCH_PATH))
        .with_method("POST")
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "HTTP method mismatch").await;

    Ok(())
}

/// Events older than the freshness window are rejected.
#[tokio::test]
async fn test_expired_event_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(6)
        .for_url(&server.url_for(SEARCH_PATH))
        .aged(120)
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "expired").await;

    Ok(())
}

/// Events from too far in the future are rejected.
#[tokio::test]
async fn test_future_event_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(6)
        .for_url(&server.url_for(SEARCH_PATH))
        .aged(-120)
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "expired").await;

    Ok(())
}

/// Only the HTTP authorization kind is accepted.
#[tokio::test]
async fn test_wrong_kind_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(7)
        .for_url(&server.url_for(SEARCH_PATH))
        .with_kind(1)
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "Invalid event kind").await;

    Ok(())
}

/// Content changed after signing no longer matches the id.
#[tokio::test]
async fn test_tampered_event_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let header = AuthHeaderBuilder::new(8)
        .for_url(&server.url_for(SEARCH_PATH))
        .tampered()
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "Event id does not match").await;

    Ok(())
}

/// A short signature is a 401, not a dropped connection.
#[tokio::test]
async fn test_short_signature_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    for sig_bytes in [0usize, 2, 33, 65] {
        let header = AuthHeaderBuilder::new(14)
            .for_url(&server.url_for(SEARCH_PATH))
            .with_signature(&"ab".repeat(sig_bytes))
            .build();

        let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

        assert_rejected(response, "Invalid event signature").await;
    }

    // The server is still serving after the rejections
    let response = get_with_header(&server.url_for("/health"), None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// Unlisted paths are 404 even without an authorization header.
#[tokio::test]
async fn test_unlisted_path_is_404_without_header() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let response = get_with_header(&server.url_for("/add/byfeedurl?url=x"), None).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("www-authenticate").is_none());

    Ok(())
}

/// Claiming someone else's pubkey fails signature verification.
#[tokio::test]
async fn test_impersonation_is_rejected() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;
    let victim = AuthHeaderBuilder::new(9).pubkey_hex();

    let header = AuthHeaderBuilder::new(10)
        .for_url(&server.url_for(SEARCH_PATH))
        .claiming_pubkey(&victim)
        .build();

    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(header)).await?;

    assert_rejected(response, "Invalid event signature").await;

    Ok(())
}

/// Restricted mode only admits allowlisted identities.
#[tokio::test]
async fn test_restricted_mode_enforces_allowlist() -> Result<(), anyhow::Error> {
    let upstream = search_upstream().await;
    let allowed = AuthHeaderBuilder::new(11);
    let allowed_pubkey = allowed.pubkey_hex();

    let server = TestProxyServer::spawn_with(
        &upstream.uri(),
        &[
            ("AUTH_MODE", "restricted"),
            ("AUTH_WHITELIST", allowed_pubkey.as_str()),
        ],
    )
    .await?;

    let allowed_header = allowed.for_url(&server.url_for(SEARCH_PATH)).build();
    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(allowed_header)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let stranger_header = AuthHeaderBuilder::new(12)
        .for_url(&server.url_for(SEARCH_PATH))
        .build();
    let response = get_with_header(&server.url_for(SEARCH_PATH), Some(stranger_header)).await?;
    assert_rejected(response, "not authorized to use this service").await;

    Ok(())
}

/// Open paths ignore the gate even in restricted mode.
#[tokio::test]
async fn test_open_paths_need_no_claim() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"results":[]}"#, "application/json"))
        .mount(&upstream)
        .await;

    let server = TestProxyServer::spawn_with(
        &upstream.uri(),
        &[
            ("AUTH_MODE", "restricted"),
            ("AUTH_WHITELIST", AuthHeaderBuilder::new(13).pubkey_hex().as_str()),
        ],
    )
    .await?;

    let response = get_with_header(&server.url_for("/search?term=rust"), None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_with_header(&server.url_for("/health"), None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// The gate runs before method checks on protected paths.
#[tokio::test]
async fn test_unauthenticated_post_is_401() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let response = reqwest::Client::new()
        .post(server.url_for("/recent/feeds"))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

/// CORS preflight is answered without authorization.
#[tokio::test]
async fn test_cors_preflight_is_answered() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, server.url_for(SEARCH_PATH))
        .header("Origin", "https://app.example")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let allowed_headers = response
        .headers()
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(allowed_headers.contains("authorization"));

    Ok(())
}

/// Simple cross-origin responses carry the CORS header too.
#[tokio::test]
async fn test_cors_header_on_rejection() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn("http://127.0.0.1:9").await?;

    let response = reqwest::Client::new()
        .get(server.url_for(SEARCH_PATH))
        .header("Origin", "https://app.example")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_some());

    Ok(())
}
