//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_mux_requests_total` (counter): requests by route decision
//! - `gateway_rpc_calls_total` (counter): RPC calls by method, side, code
//! - `gateway_rpc_duration_seconds` (histogram): RPC latency by method, side
//! - `gateway_validation_failures_total` (counter): rejected requests by method
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps tests exporter-free
//! - Prometheus exporter installed once at startup when enabled

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::mux::RouteDecision;
use opentelemetry::trace::SpanKind;

/// Install the Prometheus recorder with its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one multiplexer routing decision.
pub fn record_route(decision: RouteDecision) {
    metrics::counter!("gateway_mux_requests_total", "route" => decision.as_str()).increment(1);
}

/// Record the outcome and latency of one RPC hop.
pub fn record_rpc(method: &'static str, side: &SpanKind, code: tonic::Code, start: Instant) {
    let side = side_label(side);
    metrics::counter!(
        "gateway_rpc_calls_total",
        "method" => method,
        "side" => side,
        "code" => format!("{code:?}")
    )
    .increment(1);
    metrics::histogram!(
        "gateway_rpc_duration_seconds",
        "method" => method,
        "side" => side
    )
    .record(start.elapsed().as_secs_f64());
}

fn side_label(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Client => "client",
        SpanKind::Server => "server",
        SpanKind::Producer => "producer",
        SpanKind::Consumer => "consumer",
        SpanKind::Internal => "internal",
    }
}

/// Count a request rejected by validation.
pub fn record_validation_failure(method: &'static str) {
    metrics::counter!("gateway_validation_failures_total", "method" => method).increment(1);
}
