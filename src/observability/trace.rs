//! Distributed trace spans on OpenTelemetry.
//!
//! # Responsibilities
//! - Start root and child spans from an injected tracer provider
//! - Guarantee every started span ends exactly once
//! - Build the process provider (sampler, OTLP exporter) from configuration
//!
//! # Design Decisions
//! - The [`Tracer`] is built once at startup and passed explicitly to the
//!   components that start spans; no global provider is installed
//! - Parents are always explicit; the ambient OpenTelemetry context is never
//!   consulted, so a span without a parent is a new root
//! - [`Span::finish`] consumes the span; dropping an unfinished span ends it
//!   as cancelled, so early returns and dropped futures never leak a span

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::trace::{
    Span as _, SpanContext, SpanId, SpanKind, Status, TraceContextExt, Tracer as _,
    TracerProvider as _,
};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider, SpanData};
use opentelemetry_sdk::Resource;

use crate::config::TracingConfig;

/// Attribute set on spans that ended without an explicit outcome.
const CANCELLED_TAG: &str = "cancelled";
const ERROR_TAG: &str = "error";

/// How a span ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStatus {
    Ok,
    Failed(String),
    Cancelled,
}

impl SpanStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SpanStatus::Failed(_))
    }
}

/// A finished span as exported by the SDK.
pub type FinishedSpan = SpanData;

/// Read-side helpers over exported spans.
pub trait FinishedSpanExt {
    /// First attribute with the given key, rendered as a string.
    fn tag(&self, key: &str) -> Option<String>;

    /// The outcome recorded through [`Span::finish`] or drop.
    fn outcome(&self) -> SpanStatus;

    /// Id of the parent span; `None` for roots.
    fn parent_id(&self) -> Option<SpanId>;
}

impl FinishedSpanExt for SpanData {
    fn tag(&self, key: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    }

    fn outcome(&self) -> SpanStatus {
        match &self.status {
            Status::Error { description } => {
                if self.tag(CANCELLED_TAG).as_deref() == Some("true") {
                    SpanStatus::Cancelled
                } else {
                    SpanStatus::Failed(description.to_string())
                }
            }
            Status::Ok | Status::Unset => SpanStatus::Ok,
        }
    }

    fn parent_id(&self) -> Option<SpanId> {
        (self.parent_span_id != SpanId::INVALID).then_some(self.parent_span_id)
    }
}

/// Starts spans on an injected [`SdkTracerProvider`].
#[derive(Clone)]
pub struct Tracer {
    provider: SdkTracerProvider,
    tracer: SdkTracer,
    service: Arc<str>,
    log_spans: bool,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service", &self.service)
            .field("log_spans", &self.log_spans)
            .finish()
    }
}

impl Tracer {
    pub fn new(provider: SdkTracerProvider, service: impl Into<Arc<str>>) -> Self {
        let service: Arc<str> = service.into();
        let tracer = provider.tracer(service.to_string());
        Self {
            provider,
            tracer,
            service,
            log_spans: false,
        }
    }

    /// Also write every sampled span to the log sink when it ends.
    pub fn with_span_logging(mut self, enabled: bool) -> Self {
        self.log_spans = enabled;
        self
    }

    /// A tracer whose spans go nowhere.
    pub fn noop() -> Self {
        Self::new(SdkTracerProvider::builder().build(), "noop")
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn provider(&self) -> &SdkTracerProvider {
        &self.provider
    }

    /// Start a span, as a child of `parent` when given, otherwise as a new root.
    pub fn start_span(
        &self,
        name: impl Into<Cow<'static, str>>,
        kind: SpanKind,
        parent: Option<&SpanContext>,
    ) -> Span {
        let parent_cx = match parent {
            Some(parent) => Context::new().with_remote_span_context(parent.clone()),
            None => Context::new(),
        };
        let name = name.into();
        let inner = self
            .tracer
            .span_builder(name.clone())
            .with_kind(kind.clone())
            .start_with_context(&self.tracer, &parent_cx);

        Span {
            inner,
            name,
            kind,
            parent: parent.map(SpanContext::span_id),
            started: Instant::now(),
            log_spans: self.log_spans,
            finished: false,
        }
    }
}

/// An in-progress unit of work.
///
/// Ends exactly once: either through [`Span::finish`] or, if dropped
/// unfinished, as [`SpanStatus::Cancelled`].
pub struct Span {
    inner: opentelemetry_sdk::trace::Span,
    name: Cow<'static, str>,
    kind: SpanKind,
    parent: Option<SpanId>,
    started: Instant,
    log_spans: bool,
    finished: bool,
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("context", self.context())
            .field("finished", &self.finished)
            .finish()
    }
}

impl Span {
    pub fn context(&self) -> &SpanContext {
        self.inner.span_context()
    }

    pub fn set_tag(&mut self, key: &'static str, value: impl Into<String>) {
        self.inner.set_attribute(KeyValue::new(key, value.into()));
    }

    /// Finish the span with the given outcome.
    pub fn finish(mut self, status: SpanStatus) {
        self.complete(status);
    }

    fn complete(&mut self, status: SpanStatus) {
        if self.finished {
            return;
        }
        self.finished = true;

        match &status {
            SpanStatus::Ok => self.inner.set_status(Status::Ok),
            SpanStatus::Failed(message) => {
                self.inner.set_attribute(KeyValue::new(ERROR_TAG, "true"));
                self.inner.set_status(Status::error(message.clone()));
            }
            SpanStatus::Cancelled => {
                self.inner.set_attribute(KeyValue::new(CANCELLED_TAG, "true"));
                self.inner.set_status(Status::error("cancelled"));
            }
        }
        self.inner.end();

        if self.log_spans && self.context().is_sampled() {
            self.log(&status);
        }
    }

    fn log(&self, status: &SpanStatus) {
        let context = self.context();
        let parent = self.parent.map(|p| p.to_string()).unwrap_or_default();
        tracing::info!(
            target: "greeter_gateway::spans",
            trace_id = %context.trace_id(),
            span_id = %context.span_id(),
            parent_id = %parent,
            name = %self.name,
            kind = ?self.kind,
            status = ?status,
            duration_us = self.started.elapsed().as_micros() as u64,
            "span finished"
        );
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if !self.finished {
            self.complete(SpanStatus::Cancelled);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    #[error("failed to build OTLP span exporter for {endpoint}: {reason}")]
    Exporter { endpoint: String, reason: String },
}

/// Owns the process tracer provider; shut it down before the process exits.
pub struct ReporterHandle {
    provider: SdkTracerProvider,
}

impl fmt::Debug for ReporterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReporterHandle").finish_non_exhaustive()
    }
}

impl ReporterHandle {
    pub fn new(provider: SdkTracerProvider) -> Self {
        Self { provider }
    }

    /// Export every span still queued and stop the exporter.
    pub async fn shutdown(self) {
        let provider = self.provider;
        match tokio::task::spawn_blocking(move || provider.shutdown()).await {
            Ok(Ok(())) => tracing::debug!("tracer provider stopped"),
            Ok(Err(e)) => tracing::warn!(error = ?e, "tracer provider shutdown failed"),
            Err(e) => tracing::warn!(error = %e, "tracer provider shutdown panicked"),
        }
    }
}

/// Build the process tracer from configuration.
///
/// Must be called from within a Tokio runtime when an OTLP endpoint is set.
pub fn init_tracer(config: &TracingConfig) -> Result<(Tracer, ReporterHandle), TracerError> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .build();
    let mut builder = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            config.sample_ratio,
        ))));

    if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.clone())
            .build()
            .map_err(|e| TracerError::Exporter {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        builder = builder.with_batch_exporter(exporter);
    }

    let provider = builder.build();
    let tracer = Tracer::new(provider.clone(), config.service_name.as_str())
        .with_span_logging(config.log_spans);

    tracing::info!(
        service = %config.service_name,
        sample_ratio = config.sample_ratio,
        otlp_endpoint = ?config.otlp_endpoint,
        log_spans = config.log_spans,
        "Tracer initialized"
    );

    Ok((tracer, ReporterHandle::new(provider)))
}

#[cfg(test)]
pub(crate) mod testing {
    use opentelemetry_sdk::trace::{
        InMemorySpanExporter, InMemorySpanExporterBuilder, SdkTracerProvider,
    };

    use super::{FinishedSpan, Tracer};

    pub(crate) fn exporter() -> InMemorySpanExporter {
        InMemorySpanExporterBuilder::new()
            .build()
    }

    /// A tracer that samples everything and exports synchronously to memory.
    pub(crate) fn tracer() -> (Tracer, InMemorySpanExporter) {
        let exporter = exporter();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        (Tracer::new(provider, "test"), exporter)
    }

    pub(crate) fn finished(exporter: &InMemorySpanExporter) -> Vec<FinishedSpan> {
        exporter.get_finished_spans().unwrap_or_default()
    }
}
