use std::convert::Infallible;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::BoxError;
use futures_util::future::BoxFuture;
use tower::{Service, ServiceExt};

use super::route::RouteDecision;
use crate::observability::metrics;

/// Splits one listener between the native gRPC server and the gateway.
///
/// Both inner services are cloned per request, so readiness is always
/// reported immediately and each request drives its own clone.
#[derive(Debug, Clone)]
pub struct Multiplexer<N, G> {
    native: N,
    gateway: G,
}

impl<N, G> Multiplexer<N, G> {
    pub fn new(native: N, gateway: G) -> Self {
        Self { native, gateway }
    }
}

impl<N, G, NB> Service<Request<Body>> for Multiplexer<N, G>
where
    N: Service<Request<Body>, Response = Response<NB>, Error = Infallible> + Clone + Send + 'static,
    N::Future: Send + 'static,
    NB: http_body::Body<Data = Bytes> + Send + 'static,
    NB::Error: Into<BoxError>,
    G: Service<Request<Body>, Response = Response<Body>, Error = Infallible> + Clone + Send + 'static,
    G::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response<Body>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let decision = RouteDecision::classify(request.version(), request.headers());
        metrics::record_route(decision);

        match decision {
            RouteDecision::Native => {
                tracing::debug!(path = %request.uri().path(), "match grpc call");
                let native = self.native.clone();
                Box::pin(async move {
                    let response = native.oneshot(request).await?;
                    Ok(response.map(Body::new))
                })
            }
            RouteDecision::Gateway => {
                tracing::debug!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    "match http web call"
                );
                let gateway = self.gateway.clone();
                Box::pin(gateway.oneshot(request))
            }
        }
    }
}
