//! The `grpc.greeter.helloworld.Greeter` service.
//!
//! # Data Flow
//! ```text
//! tonic server (HTTP/2, protobuf)
//!     → greeter.rs (split request into CallContext + message)
//!     → interceptor/ (trace, then validate)
//!     → handler
//! ```
//!
//! The gateway reuses the same chain type on its client side, so both hops
//! of a gateway request produce spans.

pub mod context;
pub mod greeter;
pub mod interceptor;
pub mod message;
pub mod proto;
pub mod wkt;

pub use context::CallContext;
pub use greeter::GreeterService;
pub use interceptor::{Interceptor, InterceptorChain, Next, RpcResult, UnaryCall};
pub use message::{FieldViolation, RpcMessage, Validatable};

/// Full method paths, as they appear in the HTTP/2 `:path` pseudo-header.
pub mod methods {
    pub const SAY_HELLO: &str = "/grpc.greeter.helloworld.Greeter/SayHello";
    pub const LOGOUT: &str = "/grpc.greeter.helloworld.Greeter/Logout";
    pub const GET_USER: &str = "/grpc.greeter.helloworld.Greeter/GetUser";
}
