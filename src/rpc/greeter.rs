//! The `Greeter` service: transport glue plus the three method handlers.

use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

use super::context::CallContext;
use super::interceptor::InterceptorChain;
use super::methods;
use super::proto::greeter_server::{Greeter, GreeterServer};
use super::proto::{Empty, HelloReply, HelloRequest, UserReq, UserRes};
use crate::users::{User, UserService};

#[derive(Debug, Clone)]
pub struct GreeterService {
    chain: InterceptorChain,
    users: UserService,
    shutdown: CancellationToken,
}

impl GreeterService {
    /// `shutdown` cancels every in-flight call when it fires.
    pub fn new(chain: InterceptorChain, users: UserService, shutdown: CancellationToken) -> Self {
        Self {
            chain,
            users,
            shutdown,
        }
    }

    pub fn into_server(self) -> GreeterServer<Self> {
        GreeterServer::new(self)
    }

    fn split<T>(&self, request: Request<T>) -> (CallContext, T) {
        let (metadata, _, message) = request.into_parts();
        let ctx = CallContext::from_metadata(metadata.into_headers(), self.shutdown.child_token());
        (ctx, message)
    }
}

#[tonic::async_trait]
impl Greeter for GreeterService {
    async fn say_hello(
        &self,
        request: Request<HelloRequest>,
    ) -> Result<Response<HelloReply>, Status> {
        let (ctx, message) = self.split(request);
        self.chain
            .unary(methods::SAY_HELLO, ctx, message, say_hello)
            .await
            .map(Response::new)
    }

    async fn logout(&self, request: Request<Empty>) -> Result<Response<Empty>, Status> {
        let (ctx, message) = self.split(request);
        self.chain
            .unary(methods::LOGOUT, ctx, message, logout)
            .await
            .map(Response::new)
    }

    async fn get_user(&self, request: Request<UserReq>) -> Result<Response<UserRes>, Status> {
        let (ctx, message) = self.split(request);
        let users = &self.users;
        self.chain
            .unary(methods::GET_USER, ctx, message, move |_, req: UserReq| async move {
                users
                    .get_user(req.id)
                    .await
                    .map(UserRes::from)
                    .map_err(Status::from)
            })
            .await
            .map(Response::new)
    }
}

async fn say_hello(_ctx: CallContext, request: HelloRequest) -> Result<HelloReply, Status> {
    tracing::info!(name = %request.name, "say hello");
    Ok(HelloReply {
        message: format!("{} world", request.name),
        data: None,
        obj: None,
    })
}

async fn logout(_ctx: CallContext, _request: Empty) -> Result<Empty, Status> {
    tracing::info!("logout");
    Ok(Empty {})
}

impl From<User> for UserRes {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
        }
    }
}
