//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ratios in range)
//! - Check addresses and URLs parse
//! - Detect duplicate seed users
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human readable reason.
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new(
            "listener.max_connections",
            "must be greater than zero",
        ));
    }

    if let Some(upstream) = &config.gateway.upstream {
        match url::Url::parse(upstream) {
            Ok(url) if url.scheme() == "http" => {}
            Ok(url) => errors.push(ValidationError::new(
                "gateway.upstream",
                format!("scheme '{}' is not supported, use http", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("gateway.upstream", e.to_string())),
        }
    }
    if config.gateway.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "gateway.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.gateway.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "gateway.connect_timeout_secs",
            "must be greater than zero",
        ));
    }

    if !(0.0..=1.0).contains(&config.tracing.sample_ratio) {
        errors.push(ValidationError::new(
            "tracing.sample_ratio",
            "must be between 0.0 and 1.0",
        ));
    }
    if config.tracing.service_name.trim().is_empty() {
        errors.push(ValidationError::new("tracing.service_name", "must not be empty"));
    }
    if let Some(endpoint) = &config.tracing.otlp_endpoint {
        match url::Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "tracing.otlp_endpoint",
                format!("scheme '{}' is not supported", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("tracing.otlp_endpoint", e.to_string())),
        }
    }
    if axum::http::HeaderName::from_bytes(config.tracing.response_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "tracing.response_header",
            format!("'{}' is not a valid header name", config.tracing.response_header),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    let mut seen = HashSet::new();
    for user in &config.users {
        if !seen.insert(user.id) {
            errors.push(ValidationError::new(
                "users",
                format!("duplicate user id {}", user.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
