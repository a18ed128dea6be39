//! Request metrics.
//!
//! Metrics go through the `metrics` facade. Without an installed recorder
//! every call is a no-op; `install_exporter` wires up a Prometheus scrape
//! endpoint on its own port.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::debug;

use crate::error::ServiceError;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Rejected analysis inputs counter metric name.
pub const METRIC_ANALYZE_REJECTED: &str = "analyze_rejected_total";
/// Handler panics counter metric name.
pub const METRIC_HANDLER_PANICS: &str = "handler_panics_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of HTTP requests served"
    );
    describe_counter!(
        METRIC_ANALYZE_REJECTED,
        "Total number of /analyze requests rejected as invalid"
    );
    describe_counter!(
        METRIC_HANDLER_PANICS,
        "Total number of handler panics caught"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder with an HTTP listener on `port`.
pub fn install_exporter(port: u16) -> Result<(), ServiceError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ServiceError::Metrics(e.to_string()))
}

/// Record a served request.
pub fn record_http_request(status: u16, latency: Duration) {
    let latency_ms = latency.as_secs_f64() * 1000.0;
    counter!(METRIC_HTTP_REQUESTS, "status" => status.to_string()).increment(1);
    histogram!(METRIC_HTTP_REQUEST_LATENCY).record(latency_ms);
}

/// Increment rejected analysis counter.
pub fn inc_analyze_rejected() {
    counter!(METRIC_ANALYZE_REJECTED).increment(1);
}

/// Increment handler panics counter.
pub fn inc_handler_panics() {
    counter!(METRIC_HANDLER_PANICS).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        init_metrics();
        record_http_request(200, Duration::from_millis(3));
        inc_analyze_rejected();
        inc_handler_panics();
    }
}
