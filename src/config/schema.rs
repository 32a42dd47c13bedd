//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::users::User;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// HTTP/JSON gateway settings.
    pub gateway: GatewayConfig,

    /// Distributed trace settings.
    pub tracing: TracingConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Startup/shutdown settings.
    pub lifecycle: LifecycleConfig,

    /// Records loaded into the in-memory user store at startup.
    pub users: Vec<User>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8091").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8091".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Native endpoint the gateway re-issues calls to.
    ///
    /// Defaults to the loopback form of the listener's own address.
    pub upstream: Option<String>,

    /// Total time allowed for one gateway request, in seconds.
    pub request_timeout_secs: u64,

    /// Loopback connection establishment timeout, in seconds.
    pub connect_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

/// Distributed trace configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Service name stamped on every reported span.
    pub service_name: String,

    /// Fraction of root traces that are sampled (0.0 - 1.0).
    pub sample_ratio: f64,

    /// Emit finished spans to the log sink.
    pub log_spans: bool,

    /// OTLP/gRPC collector endpoint (e.g., "http://127.0.0.1:4317").
    /// Spans are only exported when set.
    pub otlp_endpoint: Option<String>,

    /// Response header carrying the trace id of gateway requests.
    pub response_header: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "greeter-gateway".to_string(),
            sample_ratio: 1.0,
            log_spans: true,
            otlp_endpoint: None,
            response_header: "x-trace-id".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Grace period for in-flight requests after a shutdown signal, in seconds.
    pub drain_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 10,
        }
    }
}
