//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): relayed responses by route, method, status
//! - `gateway_request_duration_seconds` (histogram): time to upstream response headers
//! - `gateway_retries_total` (counter): retried attempts by route
//! - `gateway_upstream_failures_total` (counter): failed requests by route and kind
//!
//! Without an installed recorder every call is a no-op.

use axum::http::Method;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint enabled");
    Ok(())
}

pub fn record_request(route: &str, method: &Method, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(route: &str) {
    counter!("gateway_retries_total", "route" => route.to_string()).increment(1);
}

pub fn record_failure(route: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_failures_total",
        "route" => route.to_string(),
        "kind" => kind
    )
    .increment(1);
}
