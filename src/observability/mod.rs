//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!     → trace.rs (OpenTelemetry spans, OTLP export)
//!
//! Trace context crosses process boundaries through:
//!     → propagation.rs (traceparent in HTTP headers / gRPC metadata)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Trace id flows through every hop of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod trace;

pub use opentelemetry::trace::{SpanContext, SpanId, SpanKind, TraceId};
pub use trace::{
    init_tracer, FinishedSpan, FinishedSpanExt, ReporterHandle, Span, SpanStatus, Tracer,
    TracerError,
};
