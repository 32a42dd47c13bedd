//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the native gRPC server and the gateway router
//! - Put both behind the protocol multiplexer
//! - Serve HTTP/1.1 and HTTP/2 (prior knowledge) on one listener; the
//!   `Upgrade: h2c` handshake is not performed
//! - Drain in-flight calls on shutdown, then cancel what is left

use std::sync::Arc;

use axum::http::header::InvalidHeaderName;
use axum::http::HeaderName;
use axum::ServiceExt;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::gateway::{self, client, GatewayState};
use crate::mux::Multiplexer;
use crate::net::Listener;
use crate::observability::Tracer;
use crate::rpc::{GreeterService, InterceptorChain};
use crate::users::{InMemoryUserStore, UserService, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid gateway upstream: {0}")]
    Upstream(#[from] tonic::transport::Error),
    #[error("Invalid trace response header: {0}")]
    TraceHeader(#[from] InvalidHeaderName),
}

/// Serves the Greeter service natively and through the JSON gateway.
pub struct HttpServer {
    config: ServerConfig,
    tracer: Tracer,
    users: Arc<dyn UserStore>,
}

impl HttpServer {
    /// Users come from the configuration unless replaced with
    /// [`HttpServer::with_user_store`].
    pub fn new(config: ServerConfig, tracer: Tracer) -> Self {
        let store: InMemoryUserStore = config.users.iter().cloned().collect();
        Self {
            config,
            tracer,
            users: Arc::new(store),
        }
    }

    pub fn with_user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    /// Run until `shutdown` fires, then drain.
    ///
    /// In-flight calls get the configured drain timeout to finish; calls
    /// still running after that are cancelled.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        let upstream = self
            .config
            .gateway
            .upstream
            .clone()
            .unwrap_or_else(|| client::loopback_uri(local_addr));
        let trace_header = HeaderName::try_from(self.config.tracing.response_header.as_str())?;
        let calls = CancellationToken::new();

        let greeter = GreeterService::new(
            InterceptorChain::server(self.tracer.clone()),
            UserService::new(self.users.clone()),
            calls.clone(),
        );
        let gateway = GatewayState::new(
            client::connect_lazy(&upstream, self.config.gateway.connect_timeout())?,
            self.tracer.clone(),
            trace_header,
            self.config.gateway.request_timeout(),
            calls.clone(),
        );
        let mux = Multiplexer::new(greeter.into_server(), gateway::router(gateway));

        tracing::info!(
            address = %local_addr,
            upstream = %upstream,
            "HTTP server starting"
        );

        let drain = self.config.lifecycle.drain_timeout();
        let drain_calls = calls.clone();
        let signal = async move {
            // A closed channel means the owner is gone; stop as well.
            let _ = shutdown.recv().await;
            tracing::info!(drain_timeout = ?drain, "Shutdown signal received, draining");
            tokio::spawn(async move {
                tokio::time::sleep(drain).await;
                if !drain_calls.is_cancelled() {
                    tracing::warn!("Drain timeout elapsed, cancelling in-flight calls");
                    drain_calls.cancel();
                }
            });
        };

        axum::serve(listener, mux.into_make_service())
            .with_graceful_shutdown(signal)
            .await?;

        calls.cancel();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
