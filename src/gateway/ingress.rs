//! Trace propagation for inbound gateway requests.
//!
//! Every gateway request gets a `ServeHTTP` server span. It continues the
//! caller's `traceparent` when one is present, becomes the parent of the
//! client-side RPC span, and its trace id is echoed back in a response
//! header.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

use super::GatewayState;
use crate::observability::propagation;
use crate::observability::{SpanContext, SpanKind, SpanStatus};
use crate::rpc::interceptor::GATEWAY_COMPONENT;

/// Span name for the HTTP side of a gateway request.
pub const INGRESS_SPAN: &str = "ServeHTTP";

/// The ingress span, stored in request extensions for the handlers.
#[derive(Debug, Clone)]
pub struct IngressSpan(pub SpanContext);

pub async fn trace_http(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    let parent = propagation::extract(request.headers());
    let mut span = state
        .tracer()
        .start_span(INGRESS_SPAN, SpanKind::Server, parent.as_ref());
    span.set_tag("component", GATEWAY_COMPONENT);
    span.set_tag("http.method", request.method().as_str());
    span.set_tag("http.url", request.uri().path());

    let trace_id = span.context().trace_id();
    request
        .extensions_mut()
        .insert(IngressSpan(span.context().clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
        response
            .headers_mut()
            .insert(state.trace_header().clone(), value);
    }

    let status = response.status();
    span.set_tag("http.status_code", status.as_str());
    if status.is_client_error() || status.is_server_error() {
        span.finish(SpanStatus::Failed(status.to_string()));
    } else {
        span.finish(SpanStatus::Ok);
    }
    response
}
