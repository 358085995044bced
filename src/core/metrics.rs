//! Prometheus metrics for monitoring the chat relay.
//!
//! Metrics live in the default prometheus registry and are exposed by the
//! `/metrics` handler.

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;

/// Container for all application metrics.
pub struct Metrics {
    /// Total number of requests by method, endpoint and status
    pub request_count: IntCounterVec,

    /// Request duration histogram in seconds (time to headers for streams)
    pub request_duration: HistogramVec,

    /// Number of relay streams currently open
    pub active_streams: IntGauge,

    /// SSE frames written downstream, by kind (`data` / `error`)
    pub stream_frames: IntCounterVec,

    /// Upstream failures by operation (`models` / `chat`) and kind (`status` / `transport`)
    pub upstream_errors: IntCounterVec,

    /// Streams dropped by the client before the upstream finished
    pub client_disconnects: IntCounter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize the metrics registry.
///
/// Subsequent calls return the same instance.
pub fn init_metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let request_count = register_int_counter_vec!(
            "chat_relay_requests_total",
            "Total number of requests",
            &["method", "endpoint", "status_code"]
        )
        .expect("Failed to register request_count metric");

        let request_duration = register_histogram_vec!(
            "chat_relay_request_duration_seconds",
            "Request duration in seconds",
            &["method", "endpoint"],
            vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]
        )
        .expect("Failed to register request_duration metric");

        let active_streams = register_int_gauge!(
            "chat_relay_active_streams",
            "Number of relay streams currently open"
        )
        .expect("Failed to register active_streams metric");

        let stream_frames = register_int_counter_vec!(
            "chat_relay_stream_frames_total",
            "SSE frames relayed downstream",
            &["kind"]
        )
        .expect("Failed to register stream_frames metric");

        let upstream_errors = register_int_counter_vec!(
            "chat_relay_upstream_errors_total",
            "Upstream failures",
            &["operation", "kind"]
        )
        .expect("Failed to register upstream_errors metric");

        let client_disconnects = register_int_counter!(
            "chat_relay_client_disconnects_total",
            "Streams dropped by the client before completion"
        )
        .expect("Failed to register client_disconnects metric");

        Metrics {
            request_count,
            request_duration,
            active_streams,
            stream_frames,
            upstream_errors,
            client_disconnects,
        }
    })
}

/// Get the global metrics instance, initializing it on first use.
pub fn get_metrics() -> &'static Metrics {
    init_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = init_metrics();
        let metrics2 = get_metrics();
        assert!(std::ptr::eq(metrics, metrics2));
    }

    #[test]
    fn test_request_count_metric() {
        let metrics = init_metrics();
        let labels = ["POST", "/unique-test-endpoint", "201"];

        let initial = metrics.request_count.with_label_values(&labels).get();
        metrics.request_count.with_label_values(&labels).inc();
        let after = metrics.request_count.with_label_values(&labels).get();

        assert_eq!(after, initial + 1);
    }

    #[test]
    fn test_request_duration_metric() {
        let metrics = init_metrics();
        let histogram = metrics
            .request_duration
            .with_label_values(&["GET", "/unique-duration-endpoint"]);

        histogram.observe(0.2);
        histogram.observe(1.3);

        assert_eq!(histogram.get_sample_count(), 2);
    }

    #[test]
    fn test_gather_contains_relay_metrics() {
        let metrics = init_metrics();
        metrics.stream_frames.with_label_values(&["data"]).inc();

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "chat_relay_stream_frames_total"));
    }
}
