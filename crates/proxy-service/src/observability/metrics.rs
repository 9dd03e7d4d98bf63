//! Metrics definitions for the proxy.
//!
//! All metrics follow Prometheus naming conventions:
//! - `proxy_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP method
//! - `endpoint`: allowlisted paths plus `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: `accepted` or a rejection label
//!
//! Identities never appear in labels.

use crate::services::endpoints;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("proxy_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("proxy_upstream_request".to_string()),
            &[
                0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `proxy_http_requests_total`, `proxy_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("proxy_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("proxy_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Only the proxy's own paths and allowlisted upstream paths keep their
/// name; everything else becomes `/other`.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        _ if path.starts_with("/static/") => "/static",
        _ => endpoints::all_paths()
            .find(|known| *known == path)
            .unwrap_or("/other"),
    }
}

// ============================================================================
// Authorization Metrics
// ============================================================================

/// Record the claim gate outcome
///
/// Metric: `proxy_auth_results_total`
/// Labels: `outcome` (`accepted` or a `RejectionReason` label)
pub fn record_auth_result(outcome: &'static str) {
    counter!("proxy_auth_results_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// Upstream Metrics
// ============================================================================

/// Record an upstream call
///
/// Metric: `proxy_upstream_requests_total`, `proxy_upstream_request_duration_seconds`
/// Labels: `status` (success, client_error, server_error, other, error, timeout)
pub fn record_upstream_request(status: &'static str, duration: Duration) {
    histogram!("proxy_upstream_request_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());

    counter!("proxy_upstream_requests_total", "status" => status).increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn test_record_http_request() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/health", 200, Duration::from_millis(1));
            record_http_request("GET", "/search/byterm", 401, Duration::from_millis(2));
            record_http_request("GET", "/nope", 404, Duration::from_millis(1));
            record_http_request("GET", "/recent/feeds", 504, Duration::from_secs(30));
        });

        let snapshot = snapshotter.snapshot().into_vec();

        let counters: Vec<(String, String, u64)> = snapshot
            .iter()
            .filter(|(key, _, _, _)| key.key().name() == "proxy_http_requests_total")
            .map(|(key, _, _, value)| {
                let label = |name: &str| {
                    key.key()
                        .labels()
                        .find(|label| label.key() == name)
                        .map(|label| label.value().to_string())
                        .unwrap()
                };
                let count = match value {
                    DebugValue::Counter(count) => *count,
                    other => panic!("expected counter, got {other:?}"),
                };
                (label("endpoint"), label("status_code"), count)
            })
            .collect();

        assert_eq!(counters.len(), 4);
        assert!(counters.contains(&("/health".to_string(), "200".to_string(), 1)));
        assert!(counters.contains(&("/search/byterm".to_string(), "401".to_string(), 1)));
        assert!(counters.contains(&("/other".to_string(), "404".to_string(), 1)));
        assert!(counters.contains(&("/recent/feeds".to_string(), "504".to_string(), 1)));

        let timeout_histograms = snapshot
            .iter()
            .filter(|(key, _, _, _)| {
                key.key().name() == "proxy_http_request_duration_seconds"
                    && key
                        .key()
                        .labels()
                        .any(|label| label.key() == "status" && label.value() == "timeout")
            })
            .count();
        assert_eq!(timeout_histograms, 1);
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(299), "success");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(401), "error");
        assert_eq!(categorize_status_code(404), "error");
        assert_eq!(categorize_status_code(502), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/"), "/");
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/search/byterm"), "/search/byterm");
        assert_eq!(normalize_endpoint("/lookup"), "/lookup");
    }

    #[test]
    fn test_normalize_endpoint_static_and_unknown() {
        assert_eq!(normalize_endpoint("/static/app.js"), "/static");
        assert_eq!(normalize_endpoint("/static/img/logo.png"), "/static");
        assert_eq!(normalize_endpoint("/unknown"), "/other");
        assert_eq!(normalize_endpoint("/search/byterm/x"), "/other");
        assert_eq!(normalize_endpoint("/api/1.0/search/byterm"), "/other");
    }

    #[test]
    fn test_auth_results_are_counted_by_outcome() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_auth_result("accepted");
            record_auth_result("accepted");
            record_auth_result("expired");
        });

        let counters: Vec<(String, u64)> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, _, _, _)| key.key().name() == "proxy_auth_results_total")
            .map(|(key, _, _, value)| {
                let outcome = key
                    .key()
                    .labels()
                    .find(|label| label.key() == "outcome")
                    .map(|label| label.value().to_string())
                    .unwrap();
                let count = match value {
                    DebugValue::Counter(count) => count,
                    other => panic!("expected counter, got {other:?}"),
                };
                (outcome, count)
            })
            .collect();

        assert!(counters.contains(&("accepted".to_string(), 2)));
        assert!(counters.contains(&("expired".to_string(), 1)));
    }

    #[test]
    fn test_upstream_metrics_use_status_label() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_upstream_request("success", Duration::from_millis(40));
            record_upstream_request("timeout", Duration::from_secs(10));
        });

        let names: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, _)| key.key().name().to_string())
            .collect();

        assert!(names.iter().any(|n| n == "proxy_upstream_requests_total"));
        assert!(names
            .iter()
            .any(|n| n == "proxy_upstream_request_duration_seconds"));
    }
}
