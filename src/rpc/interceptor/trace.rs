use std::time::Instant;

use async_trait::async_trait;
use axum::http::HeaderValue;
use tonic::Code;
use tracing::Instrument;

use super::{Interceptor, Next, RpcResult, UnaryCall};
use crate::observability::propagation::{self, CALLER_COMPONENT};
use crate::observability::{metrics, SpanKind, SpanStatus, Tracer};

/// Component tag for calls made by native gRPC clients.
pub const GRPC_COMPONENT: &str = "gRPC";

/// Component tag for calls issued by the HTTP/JSON gateway.
pub const GATEWAY_COMPONENT: &str = "grpc-gateway";

/// Opens a span around every call.
///
/// On the server side the parent comes from the inbound `traceparent`; on
/// the client side it is the span already attached to the call context, and
/// the new span is written into the outbound metadata.
#[derive(Debug, Clone)]
pub struct TraceInterceptor {
    tracer: Tracer,
    kind: SpanKind,
    component: &'static str,
}

impl TraceInterceptor {
    pub fn server(tracer: Tracer) -> Self {
        Self {
            tracer,
            kind: SpanKind::Server,
            component: GRPC_COMPONENT,
        }
    }

    pub fn client(tracer: Tracer, component: &'static str) -> Self {
        Self {
            tracer,
            kind: SpanKind::Client,
            component,
        }
    }

    fn side(&self) -> &'static str {
        if self.kind == SpanKind::Server {
            "server"
        } else {
            "client"
        }
    }
}

#[async_trait]
impl Interceptor for TraceInterceptor {
    fn name(&self) -> &'static str {
        "trace"
    }

    async fn intercept(&self, mut call: UnaryCall, next: Next<'_>) -> RpcResult {
        let server = self.kind == SpanKind::Server;
        let parent = if server {
            propagation::extract(call.ctx.metadata())
        } else {
            call.ctx.span().cloned()
        };

        let mut span = self
            .tracer
            .start_span(call.method, self.kind.clone(), parent.as_ref());
        span.set_tag("component", self.component);
        span.set_tag("span.kind", self.side());
        let context = span.context().clone();

        if server {
            let caller = call
                .ctx
                .metadata()
                .get(CALLER_COMPONENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or(GRPC_COMPONENT)
                .to_string();
            span.set_tag("caller.component", caller);
        } else {
            let metadata = call.ctx.metadata_mut();
            propagation::inject(&context, metadata);
            metadata.insert(CALLER_COMPONENT, HeaderValue::from_static(self.component));
        }
        let trace_id = context.trace_id();
        call.ctx.attach_span(context);

        let method = call.method;
        let started = Instant::now();
        let log_span = tracing::info_span!(
            "rpc",
            method,
            kind = self.side(),
            trace_id = %trace_id,
        );
        let result = next.run(call).instrument(log_span).await;

        let code = match &result {
            Ok(_) => Code::Ok,
            Err(status) => status.code(),
        };
        metrics::record_rpc(method, &self.kind, code, started);

        match &result {
            Ok(_) => span.finish(SpanStatus::Ok),
            Err(status) => {
                span.set_tag("grpc.code", format!("{:?}", status.code()));
                tracing::debug!(method, code = ?status.code(), message = status.message(), "rpc failed");
                span.finish(SpanStatus::Failed(status.message().to_string()));
            }
        }
        result
    }
}
