//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): relayed requests by method, status
//! - `gateway_request_duration_seconds` (histogram): from request arrival until
//!   the relayed body has been fully sent (or abandoned by the caller)
//! - `gateway_upstream_errors_total` (counter): synthesized 502s by error kind
//!
//! Recording is a no-op until a recorder is installed, so the forwarder can
//! record unconditionally.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record an upstream failure that was turned into a 502.
pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}
