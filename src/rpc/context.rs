//! Per-call context: metadata, deadline, cancellation and the active span.

use std::time::Duration;

use axum::http::HeaderMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::observability::SpanContext;

/// gRPC deadline header.
pub const GRPC_TIMEOUT: &str = "grpc-timeout";

#[derive(Debug, Clone)]
pub struct CallContext {
    metadata: HeaderMap,
    deadline: Option<Instant>,
    cancel: CancellationToken,
    span: Option<SpanContext>,
}

impl CallContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            metadata: HeaderMap::new(),
            deadline: None,
            cancel,
            span: None,
        }
    }

    /// Build a context for an inbound call, honouring its `grpc-timeout`.
    pub fn from_metadata(metadata: HeaderMap, cancel: CancellationToken) -> Self {
        let timeout = metadata
            .get(GRPC_TIMEOUT)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_grpc_timeout);
        let ctx = Self {
            metadata,
            ..Self::new(cancel)
        };
        match timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    pub fn with_metadata(mut self, metadata: HeaderMap) -> Self {
        self.metadata = metadata;
        self
    }

    /// Tighten the deadline to at most `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HeaderMap {
        &mut self.metadata
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn span(&self) -> Option<&SpanContext> {
        self.span.as_ref()
    }

    /// Make `span` the active span for everything downstream of this point.
    pub fn attach_span(&mut self, span: SpanContext) {
        self.span = Some(span);
    }
}

/// Parse a `grpc-timeout` value: up to eight digits followed by a unit
/// (`H`, `M`, `S`, `m`, `u`, `n`).
pub fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.len() < 2 || value.len() > 9 || !value.is_ascii() {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let amount: u64 = digits.parse().ok()?;
    let timeout = match unit {
        "H" => Duration::from_secs(amount * 3600),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}
