//! Forwarding integration tests.
//!
//! Runs the proxy against a wiremock upstream and checks what reaches the
//! upstream and what comes back to the client.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proxy_service::services::upstream_client::{
    credential_hash, AUTH_DATE_HEADER, AUTH_KEY_HEADER,
};
use proxy_test_utils::{TestProxyServer, TEST_API_KEY, TEST_API_SECRET};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Gate disabled so forwarding can be tested independently of claims.
const NO_GATE: &[(&str, &str)] = &[("NOSTR_AUTH_ENABLED", "false")];

/// Credentials are attached to protected endpoints and the hash is correct.
#[tokio::test]
async fn test_protected_endpoint_carries_credentials() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/recent/feeds"))
        .and(query_param("max", "5"))
        .and(header(AUTH_KEY_HEADER, TEST_API_KEY))
        .and(header_exists(AUTH_DATE_HEADER))
        .and(header_exists("authorization"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"status":"true","feeds":[]}"#, "application/json"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let server = TestProxyServer::spawn_with(&upstream.uri(), NO_GATE).await?;

    let response = reqwest::get(format!("{}/recent/feeds?max=5", server.url())).await?;
    assert_eq!(response.status(), 200);

    let requests = upstream
        .received_requests()
        .await
        .expect("request recording is enabled");
    let request = requests.first().expect("upstream was called");

    let date = request
        .headers
        .get(AUTH_DATE_HEADER)
        .and_then(|v| v.to_str().ok())
        .expect("date header present");
    let authorization = request
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .expect("authorization header present");
    assert_eq!(
        authorization,
        credential_hash(TEST_API_KEY, TEST_API_SECRET, date)
    );

    let user_agent = request
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(user_agent.starts_with("podcast-proxy/"));

    Ok(())
}

/// Open endpoints are forwarded without credential headers.
#[tokio::test]
async fn test_open_endpoint_has_no_credentials() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&upstream)
        .await;

    // Gate stays enabled: /lookup needs no claim
    let server = TestProxyServer::spawn(&upstream.uri()).await?;

    let response = reqwest::get(format!("{}/lookup?id=123", server.url())).await?;
    assert_eq!(response.status(), 200);

    let requests = upstream
        .received_requests()
        .await
        .expect("request recording is enabled");
    let request = requests.first().expect("upstream was called");
    assert!(request.headers.get(AUTH_KEY_HEADER).is_none());
    assert!(request.headers.get(AUTH_DATE_HEADER).is_none());
    assert!(request.headers.get("authorization").is_none());
    assert_eq!(request.url.query(), Some("id=123"));

    Ok(())
}

/// Successful responses get a cache header and keep the upstream body.
#[tokio::test]
async fn test_success_response_is_cacheable() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/stats/current"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"stats":{"feedCountTotal":1}}"#, "application/json"),
        )
        .mount(&upstream)
        .await;

    let server = TestProxyServer::spawn_with(
        &upstream.uri(),
        &[("NOSTR_AUTH_ENABLED", "false"), ("CACHE_MAX_AGE_SECONDS", "60")],
    )
    .await?;

    let response = reqwest::get(format!("{}/stats/current", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=60")
    );

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["stats"]["feedCountTotal"], 1);

    Ok(())
}

/// Upstream error statuses pass through without a cache header.
#[tokio::test]
async fn test_upstream_error_status_passes_through() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/1.0/podcasts/byfeedid"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_raw(r#"{"status":"false","description":"bad id"}"#, "application/json"),
        )
        .mount(&upstream)
        .await;

    let server = TestProxyServer::spawn_with(&upstream.uri(), NO_GATE).await?;

    let response = reqwest::get(format!("{}/podcasts/byfeedid?id=x", server.url())).await?;

    assert_eq!(response.status(), 400);
    assert!(response.headers().get("cache-control").is_none());

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["description"], "bad id");

    Ok(())
}

/// An unreachable upstream yields 502.
#[tokio::test]
async fn test_unreachable_upstream_returns_502() -> Result<(), anyhow::Error> {
    let server = TestProxyServer::spawn_with("http://127.0.0.1:9", NO_GATE).await?;

    let response = reqwest::get(format!("{}/categories/list", server.url())).await?;

    assert_eq!(response.status(), 502);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"], "Bad Gateway");

    Ok(())
}

/// Non-GET methods on allowlisted endpoints are rejected before forwarding.
#[tokio::test]
async fn test_post_returns_405() -> Result<(), anyhow::Error> {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let server = TestProxyServer::spawn_with(&upstream.uri(), NO_GATE).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/recent/feeds", server.url()))
        .body("{}")
        .send()
        .await?;

    assert_eq!(response.status(), 405);

    Ok(())
}
