//! Unary interceptor chain.
//!
//! # Data Flow
//! ```text
//! typed request
//!     → UnaryCall (type-erased message + CallContext)
//!     → interceptor[0] → interceptor[1] → ... → terminal handler
//!     → typed response
//! ```
//!
//! Each stage either short-circuits with a `Status` or hands the call to
//! [`Next::run`]. The whole chain races the call's cancellation token and
//! deadline; losing that race drops the in-flight stages, so their spans end
//! as cancelled.

mod trace;
mod validate;

pub use trace::{TraceInterceptor, GATEWAY_COMPONENT, GRPC_COMPONENT};
pub use validate::ValidationInterceptor;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use tonic::Status;

use super::context::CallContext;
use super::message::RpcMessage;
use crate::observability::Tracer;

/// Outcome of a type-erased call.
pub type RpcResult = Result<Box<dyn Any + Send>, Status>;

type Terminal<'a> = Box<dyn FnOnce(UnaryCall) -> BoxFuture<'a, RpcResult> + Send + 'a>;

/// One unary call in flight.
#[derive(Debug)]
pub struct UnaryCall {
    /// Full method path, e.g. `/grpc.greeter.helloworld.Greeter/SayHello`.
    pub method: &'static str,
    pub ctx: CallContext,
    pub message: Box<dyn RpcMessage>,
}

/// A stage of the chain.
#[async_trait]
pub trait Interceptor: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn intercept(&self, call: UnaryCall, next: Next<'_>) -> RpcResult;
}

/// The remainder of the chain after the current stage.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Interceptor>],
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    pub async fn run(self, call: UnaryCall) -> RpcResult {
        match self.rest.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    rest,
                    terminal: self.terminal,
                };
                stage.intercept(call, next).await
            }
            None => (self.terminal)(call).await,
        }
    }
}

/// An ordered list of interceptors wrapped around every unary call.
#[derive(Debug, Clone)]
pub struct InterceptorChain {
    stages: Arc<[Arc<dyn Interceptor>]>,
}

impl InterceptorChain {
    pub fn new(stages: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            stages: stages.into(),
        }
    }

    /// Server side: trace first so validation failures are still traced.
    pub fn server(tracer: Tracer) -> Self {
        Self::new(vec![
            Arc::new(TraceInterceptor::server(tracer)),
            Arc::new(ValidationInterceptor),
        ])
    }

    /// Client side of the gateway hop.
    pub fn client(tracer: Tracer, component: &'static str) -> Self {
        Self::new(vec![Arc::new(TraceInterceptor::client(tracer, component))])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run `handler` for `request` behind every stage of the chain.
    pub async fn unary<Req, Res, F, Fut>(
        &self,
        method: &'static str,
        ctx: CallContext,
        request: Req,
        handler: F,
    ) -> Result<Res, Status>
    where
        Req: RpcMessage,
        Res: Send + 'static,
        F: FnOnce(CallContext, Req) -> Fut + Send,
        Fut: Future<Output = Result<Res, Status>> + Send,
    {
        let cancel = ctx.cancellation().clone();
        let deadline = ctx.deadline();

        let terminal: Terminal<'_> = Box::new(move |call: UnaryCall| {
            let UnaryCall {
                method,
                ctx,
                message,
            } = call;
            async move {
                let request = message.into_any().downcast::<Req>().map_err(|_| {
                    Status::internal(format!("{method}: request type changed in chain"))
                })?;
                let response = handler(ctx, *request).await?;
                Ok(Box::new(response) as Box<dyn Any + Send>)
            }
            .boxed()
        });

        let call = UnaryCall {
            method,
            ctx,
            message: Box::new(request),
        };
        let run = Next {
            rest: &self.stages,
            terminal,
        }
        .run(call);

        let bounded = async move {
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, run)
                    .await
                    .unwrap_or_else(|_| Err(Status::deadline_exceeded("deadline exceeded"))),
                None => run.await,
            }
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Status::cancelled("call cancelled")),
            result = bounded => result,
        }?;

        response
            .downcast::<Res>()
            .map(|response| *response)
            .map_err(|_| Status::internal(format!("{method}: response type changed in chain")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use tonic::Code;

    use super::*;
    use crate::observability::trace::testing::{finished, tracer};
    use crate::observability::{FinishedSpanExt, SpanKind, SpanStatus};
    use crate::rpc::proto::{Empty, HelloRequest};

    const METHOD: &str = "/test.Service/Method";

    fn ctx() -> CallContext {
        CallContext::new(CancellationToken::new())
    }

    #[derive(Debug)]
    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Interceptor for Record {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn intercept(&self, call: UnaryCall, next: Next<'_>) -> RpcResult {
            self.log.lock().unwrap().push(self.name);
            let result = next.run(call).await;
            self.log.lock().unwrap().push(self.name);
            result
        }
    }

    #[tokio::test]
    async fn stages_nest_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorChain::new(vec![
            Arc::new(Record {
                name: "outer",
                log: log.clone(),
            }),
            Arc::new(Record {
                name: "inner",
                log: log.clone(),
            }),
        ]);

        let handler_log = log.clone();
        let reply = chain
            .unary(METHOD, ctx(), Empty {}, |_, _| async move {
                handler_log.lock().unwrap().push("handler");
                Ok::<_, Status>(7u32)
            })
            .await
            .unwrap();

        assert_eq!(reply, 7);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer", "inner", "handler", "inner", "outer"]
        );
    }

    #[tokio::test]
    async fn empty_chain_calls_handler() {
        let chain = InterceptorChain::new(Vec::new());
        let name = chain
            .unary(METHOD, ctx(), HelloRequest { name: "x".into() }, |_, req| async move {
                Ok::<_, Status>(req.name)
            })
            .await
            .unwrap();
        assert_eq!(name, "x");
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_handler() {
        let (tracer, spans) = tracer();
        let chain = InterceptorChain::server(tracer);
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let err = chain
            .unary(METHOD, ctx(), HelloRequest { name: "".into() }, move |_, _| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Status>(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let finished = finished(&spans);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].span_kind, SpanKind::Server);
        assert!(finished[0].outcome().is_failed());
    }

    #[tokio::test]
    async fn unvalidated_message_passes_through() {
        let (tracer, spans) = tracer();
        let chain = InterceptorChain::server(tracer);
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        chain
            .unary(METHOD, ctx(), Empty {}, move |_, req| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Status>(req)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let finished = finished(&spans);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].outcome(), SpanStatus::Ok);
        assert_eq!(finished[0].name, METHOD);
    }

    #[tokio::test]
    async fn handler_sees_active_span() {
        let (tracer, spans) = tracer();
        let chain = InterceptorChain::server(tracer);

        let seen = chain
            .unary(METHOD, ctx(), Empty {}, |ctx, _| async move {
                Ok::<_, Status>(ctx.span().cloned())
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(finished(&spans)[0].span_context, seen);
    }

    #[tokio::test]
    async fn handler_error_fails_span() {
        let (tracer, spans) = tracer();
        let chain = InterceptorChain::server(tracer);

        let err = chain
            .unary(METHOD, ctx(), Empty {}, |_, _| async {
                Err::<(), _>(Status::not_found("nope"))
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::NotFound);
        let finished = finished(&spans);
        assert_eq!(finished[0].outcome(), SpanStatus::Failed("nope".into()));
        assert_eq!(finished[0].tag("error").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn cancellation_ends_span_as_cancelled() {
        let (tracer, spans) = tracer();
        let chain = InterceptorChain::server(tracer);
        let token = CancellationToken::new();
        let ctx = CallContext::new(token.clone());

        let trigger = token.clone();
        let err = chain
            .unary(METHOD, ctx, Empty {}, |_, _| async move {
                trigger.cancel();
                std::future::pending::<Result<(), Status>>().await
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::Cancelled);
        let finished = finished(&spans);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].outcome(), SpanStatus::Cancelled);
    }

    #[tokio::test]
    async fn deadline_exceeded() {
        let (tracer, spans) = tracer();
        let chain = InterceptorChain::server(tracer);
        let ctx = ctx().with_timeout(Duration::from_millis(50));

        let err = chain
            .unary(METHOD, ctx, Empty {}, |_, _| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, Status>(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), Code::DeadlineExceeded);
        assert_eq!(finished(&spans)[0].outcome(), SpanStatus::Cancelled);
    }

    #[test]
    fn composition_order() {
        let server = InterceptorChain::server(Tracer::noop());
        assert_eq!(server.stage_names(), vec!["trace", "validate"]);
        let client = InterceptorChain::client(Tracer::noop(), GATEWAY_COMPONENT);
        assert_eq!(client.stage_names(), vec!["trace"]);
    }
}
