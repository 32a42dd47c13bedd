//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → server.rs (axum::serve, HTTP/1.1 + h2c)
//!     → mux (native gRPC or gateway, per request)
//!     → Send to client
//! ```

pub mod server;

pub use server::{HttpServer, ServerError};
