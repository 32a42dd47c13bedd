//! Greeter gateway
//!
//! Serves the `grpc.greeter.helloworld.Greeter` service to native gRPC
//! clients and, on the same port, to HTTP/JSON clients through a gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!  gRPC (h2c)          ┐
//!  HTTP/1.1 JSON       ├─▶ net::Listener ─▶ http::HttpServer ─▶ mux
//!  HTTP/2 JSON         ┘                                        │
//!                              ┌────────────────────────────────┴──────┐
//!                              ▼                                       ▼
//!                        rpc::GreeterService                     gateway router
//!                        trace ─▶ validate ─▶ handler            ServeHTTP span
//!                              ▲                                 client trace
//!                              └──────── loopback gRPC ──────────────────┘
//!
//!  Cross-cutting: config · observability · lifecycle · users
//! ```

use std::path::PathBuf;

use clap::Parser;

use greeter_gateway::config::{self, ServerConfig};
use greeter_gateway::lifecycle;
use greeter_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "greeter-gateway")]
#[command(about = "Greeter gRPC service with an HTTP/JSON gateway on the same port", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.gateway.request_timeout_secs,
        "greeter-gateway starting"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
