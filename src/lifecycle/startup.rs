//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//! - Flush pending spans after the server stops
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last, once everything it needs exists

use crate::config::ServerConfig;
use crate::http::{HttpServer, ServerError};
use crate::net::{Listener, ListenerError};
use crate::observability::{self, metrics, TracerError};

use super::Shutdown;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error(transparent)]
    Tracer(#[from] TracerError),
}

/// Run the gateway until a shutdown signal arrives.
///
/// Logging must already be initialized.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    let (tracer, reporter) = observability::init_tracer(&config.tracing)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let signals = shutdown.trigger_on_signal();

    let result = HttpServer::new(config, tracer)
        .run(listener, shutdown.subscribe())
        .await;

    signals.abort();
    reporter.shutdown().await;
    result.map_err(StartupError::from)
}
