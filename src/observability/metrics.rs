//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, provider
//! - `proxy_request_duration_seconds` (histogram): time until response
//!   headers, by provider
//! - `proxy_upstream_errors_total` (counter): transport failures by provider
//!   and kind
//!
//! # Design Decisions
//! - Low-overhead metric updates via the `metrics` facade; without an
//!   installed recorder the macros are no-ops
//! - Labels for provider and status code only, keeping cardinality bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, provider: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "provider" => provider.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "proxy_request_duration_seconds",
        "provider" => provider.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a transport failure talking to an upstream.
pub fn record_upstream_error(provider: &str, kind: &'static str) {
    metrics::counter!(
        "proxy_upstream_errors_total",
        "provider" => provider.to_string(),
        "kind" => kind
    )
    .increment(1);
}
