//! Trace context propagation over HTTP headers and gRPC metadata.
//!
//! W3C Trace Context (`traceparent` / `tracestate`) through the OpenTelemetry
//! [`TraceContextPropagator`]. Both carriers are an [`http::HeaderMap`]
//! underneath, so one pair of adapters serves them.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanContext, TraceContextExt};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;

/// W3C trace context header.
pub const TRACEPARENT: &str = "traceparent";

/// Names the component that issued an RPC, set by client-side trace stages.
pub const CALLER_COMPONENT: &str = "x-caller-component";

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
            return;
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            self.0.insert(name, value);
        }
    }
}

/// Extract a parent span context from a carrier.
///
/// A missing or malformed `traceparent` yields `None`, which starts a new
/// root trace.
pub fn extract(headers: &HeaderMap) -> Option<SpanContext> {
    let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let span = cx.span();
    let context = span.span_context();
    if context.is_valid() {
        Some(context.clone())
    } else {
        if headers.contains_key(TRACEPARENT) {
            tracing::debug!("ignoring malformed inbound trace context");
        }
        None
    }
}

/// Write a span context into a carrier, replacing any previous value.
pub fn inject(context: &SpanContext, headers: &mut HeaderMap) {
    let cx = Context::new().with_remote_span_context(context.clone());
    TraceContextPropagator::new().inject_context(&cx, &mut HeaderInjector(headers));
}

#[cfg(test)]
mod tests {
    use opentelemetry::trace::{SpanId, TraceId};

    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn headers_with(traceparent: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_static(traceparent));
        headers
    }

    #[test]
    fn extract_sampled_parent() {
        let ctx = extract(&headers_with(SAMPLE)).unwrap();
        assert_eq!(
            ctx.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
        assert_eq!(ctx.span_id(), SpanId::from_hex("00f067aa0ba902b7").unwrap());
        assert!(ctx.is_sampled());
        assert!(ctx.is_remote());
    }

    #[test]
    fn malformed_starts_root() {
        for bad in [
            "",
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473-00f067aa0ba902b7-01",
        ] {
            assert!(extract(&headers_with(bad)).is_none(), "{bad}");
        }
        assert!(extract(&HeaderMap::new()).is_none());
    }

    #[test]
    fn inject_then_extract() {
        let ctx = extract(&headers_with(SAMPLE)).unwrap();
        let mut headers = HeaderMap::new();
        inject(&ctx, &mut headers);

        assert_eq!(headers.get(TRACEPARENT).unwrap(), SAMPLE);
        let back = extract(&headers).unwrap();
        assert_eq!(back.trace_id(), ctx.trace_id());
        assert_eq!(back.span_id(), ctx.span_id());
    }

    #[test]
    fn inject_replaces_previous_value() {
        let ctx = extract(&headers_with(SAMPLE)).unwrap();
        let mut headers =
            headers_with("00-11111111111111111111111111111111-2222222222222222-00");
        inject(&ctx, &mut headers);
        assert_eq!(headers.get_all(TRACEPARENT).iter().count(), 1);
        assert_eq!(headers.get(TRACEPARENT).unwrap(), SAMPLE);
    }
}
