//! HTTP metrics middleware for capturing all request/response metrics
//!
//! Records every response, including ones produced before a handler runs:
//! 401 from the claim gate, 408 from the timeout layer, CORS preflights.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Middleware that records HTTP request metrics for all responses
///
/// Applied as the outermost layer. The path is normalized before it is
/// used as a label.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}
