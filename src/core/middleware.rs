//! HTTP middleware for request tracking and metrics.

use crate::core::logging::{generate_request_id, REQUEST_ID};
use crate::core::metrics::get_metrics;
use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Header used to carry the request ID in and out.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assign a request ID and run the rest of the stack inside its scope.
///
/// An inbound `x-request-id` is reused so that IDs can be correlated with
/// the caller's own logs; otherwise a fresh UUID is generated. The ID is
/// echoed on the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(generate_request_id);

    let mut response = REQUEST_ID.scope(request_id.clone(), next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Middleware for tracking request metrics.
pub struct MetricsMiddleware;

impl MetricsMiddleware {
    /// Record request count and duration by matched route.
    ///
    /// For streaming responses the duration is time to headers, since
    /// `next.run()` returns before the body has been written.
    pub async fn track_metrics(request: Request, next: Next) -> Response {
        let endpoint = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "unmatched".to_string());
        let method = request.method().to_string();

        if endpoint == "/metrics" {
            return next.run(request).await;
        }

        let start = Instant::now();
        let response = next.run(request).await;
        let duration = start.elapsed().as_secs_f64();
        let status_code = response.status().as_u16().to_string();

        let metrics = get_metrics();
        metrics
            .request_count
            .with_label_values(&[&method, &endpoint, &status_code])
            .inc();
        metrics
            .request_duration
            .with_label_values(&[&method, &endpoint])
            .observe(duration);

        tracing::debug!(
            method = %method,
            endpoint = %endpoint,
            status = %status_code,
            duration_ms = (duration * 1000.0) as u64,
            "Request handled"
        );

        response
    }
}
