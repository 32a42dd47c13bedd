//! gRPC service and HTTP/JSON gateway multiplexed on one port.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod mux;
pub mod net;
pub mod observability;
pub mod rpc;
pub mod users;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
