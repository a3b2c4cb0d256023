//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cep_requests_total` (counter): handled requests by service, status
//! - `cep_request_duration_seconds` (histogram): handler latency by service
//! - `cep_upstream_requests_total` (counter): outbound calls by target, outcome
//! - `cep_upstream_duration_seconds` (histogram): outbound latency by target
//! - `cep_spans_dropped_total` (counter): finished spans not exported, by reason
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Serve a Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(service: &str, status: u16, start: Instant) {
    counter!(
        "cep_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("cep_request_duration_seconds", "service" => service.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one outbound call. `outcome` is `"ok"` or `"error"`.
pub fn record_upstream(target: &'static str, outcome: &'static str, start: Instant) {
    counter!(
        "cep_upstream_requests_total",
        "target" => target,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("cep_upstream_duration_seconds", "target" => target)
        .record(start.elapsed().as_secs_f64());
}

/// Record one finished span discarded before export.
pub fn record_dropped_span(reason: &'static str) {
    counter!("cep_spans_dropped_total", "reason" => reason).increment(1);
}
