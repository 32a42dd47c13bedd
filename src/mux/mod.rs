//! Protocol multiplexing on a single listener.
//!
//! # Data Flow
//! ```text
//! request (HTTP/1.1 or HTTP/2)
//!     → route.rs (classify by protocol version + content-type)
//!     → service.rs (dispatch)
//!         → native gRPC server
//!         → HTTP/JSON gateway
//! ```
//!
//! # Design Decisions
//! - Decided per request, not per connection: an HTTP/2 connection may carry
//!   both gRPC and JSON requests
//! - Nothing is buffered or inspected beyond the request head
//!
//! # Limitations
//! - HTTP/2 without TLS is only recognized with prior knowledge. An
//!   HTTP/1.1 request carrying `Upgrade: h2c` is not upgraded; it is served
//!   as HTTP/1.1 and therefore always lands on the gateway, even with a
//!   gRPC content type

mod route;
mod service;

pub use route::{is_grpc_content_type, RouteDecision};
pub use service::Multiplexer;
