//! HTTP/JSON gateway in front of the Greeter service.
//!
//! # Data Flow
//! ```text
//! HTTP request (JSON)
//!     → ingress.rs (ServeHTTP span, trace id response header)
//!     → handlers.rs (path/body → request message)
//!     → client-side interceptor chain (client span, traceparent injection)
//!     → client.rs (gRPC over loopback into the native server)
//!     → JSON response, or error.rs (status → HTTP code + error body)
//! ```
//!
//! # Routes
//! - `POST /v1/hello` → `SayHello`, whole body is the request
//! - `POST /v1/logout` → `Logout`
//! - `GET /v1/user/{id}` → `GetUser`

pub mod body;
pub mod client;
pub mod error;
pub mod handlers;
pub mod ingress;

pub use error::{http_status, ErrorBody, GatewayError};
pub use ingress::IngressSpan;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;
use tonic::transport::Channel;
use tonic::{Extensions, Status};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::observability::Tracer;
use crate::rpc::context::{parse_grpc_timeout, GRPC_TIMEOUT};
use crate::rpc::interceptor::{InterceptorChain, GATEWAY_COMPONENT};
use crate::rpc::proto::greeter_client::GreeterClient;
use crate::rpc::{CallContext, RpcMessage};

/// Shared state of the gateway routes.
#[derive(Debug, Clone)]
pub struct GatewayState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: GreeterClient<Channel>,
    chain: InterceptorChain,
    tracer: Tracer,
    trace_header: HeaderName,
    request_timeout: Duration,
    shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(
        client: GreeterClient<Channel>,
        tracer: Tracer,
        trace_header: HeaderName,
        request_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        let chain = InterceptorChain::client(tracer.clone(), GATEWAY_COMPONENT);
        Self {
            inner: Arc::new(Inner {
                client,
                chain,
                tracer,
                trace_header,
                request_timeout,
                shutdown,
            }),
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.inner.tracer
    }

    /// Response header carrying the trace id.
    pub fn trace_header(&self) -> &HeaderName {
        &self.inner.trace_header
    }

    /// Context for the outbound call of one HTTP request.
    ///
    /// The deadline is the configured request timeout, tightened by a
    /// `grpc-timeout` request header when the caller sends one.
    pub fn call_context(&self, headers: &HeaderMap, ingress: IngressSpan) -> CallContext {
        let requested = headers
            .get(GRPC_TIMEOUT)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout);

        let mut ctx = CallContext::new(self.inner.shutdown.child_token())
            .with_metadata(client::forwarded_metadata(headers))
            .with_timeout(self.inner.request_timeout);
        if let Some(requested) = requested {
            ctx = ctx.with_timeout(requested);
        }
        ctx.attach_span(ingress.0);
        ctx
    }

    /// Issue one RPC through the client-side chain.
    pub async fn invoke<Req, Res, F, Fut>(
        &self,
        method: &'static str,
        ctx: CallContext,
        request: Req,
        call: F,
    ) -> Result<Res, Status>
    where
        Req: RpcMessage,
        Res: Send + 'static,
        F: FnOnce(GreeterClient<Channel>, tonic::Request<Req>) -> Fut + Send,
        Fut: Future<Output = Result<tonic::Response<Res>, Status>> + Send,
    {
        let client = self.inner.client.clone();
        self.inner
            .chain
            .unary(method, ctx, request, move |ctx, request| async move {
                let mut outbound = tonic::Request::from_parts(
                    MetadataMap::from_headers(ctx.metadata().clone()),
                    Extensions::new(),
                    request,
                );
                if let Some(remaining) = ctx.remaining() {
                    outbound.set_timeout(remaining);
                }
                call(client, outbound)
                    .await
                    .map(tonic::Response::into_inner)
                    .map_err(|status| client::deadline_status(status, ctx.remaining()))
            })
            .await
    }
}

/// Build the gateway router with its middleware stack.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/hello", post(handlers::say_hello))
        .route("/v1/logout", post(handlers::logout))
        .route("/v1/user/{id}", get(handlers::get_user))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ingress::trace_http,
        ))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
