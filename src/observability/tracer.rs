//! Span lifecycle.
//!
//! # Responsibilities
//! - Start server spans from an inbound context and client spans per call
//! - Close each span exactly once, on every exit path
//! - Hand finished spans to the configured reporter
//!
//! # Design Decisions
//! - `ActiveSpan` is an RAII guard: dropping it finishes the span, so early
//!   returns and `?` cannot leak an open span
//! - Reporters are trait objects so tests can record spans in memory

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use axum::http::StatusCode;
use serde::Serialize;

use crate::observability::trace_context::TraceContext;

/// Role of a span in a request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanKind {
    Server,
    Client,
}

/// A closed span, ready for export.
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub service_name: String,
    pub name: String,
    pub kind: SpanKind,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub start: SystemTime,
    pub duration: Duration,
    pub tags: BTreeMap<String, String>,
}

impl FinishedSpan {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Destination for finished spans. Must tolerate concurrent callers.
pub trait SpanReporter: Send + Sync {
    fn report(&self, span: FinishedSpan);
}

/// Discards every span.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl SpanReporter for NoopReporter {
    fn report(&self, _span: FinishedSpan) {}
}

/// Keeps finished spans in memory.
#[derive(Debug, Default)]
pub struct InMemoryReporter {
    spans: Mutex<Vec<FinishedSpan>>,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every span reported so far, in reporting order.
    pub fn spans(&self) -> Vec<FinishedSpan> {
        self.spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn spans_named(&self, name: &str) -> Vec<FinishedSpan> {
        self.spans().into_iter().filter(|s| s.name == name).collect()
    }
}

impl SpanReporter for InMemoryReporter {
    fn report(&self, span: FinishedSpan) {
        self.spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(span);
    }
}

/// Creates spans on behalf of one service.
#[derive(Clone)]
pub struct Tracer {
    service_name: Arc<str>,
    reporter: Arc<dyn SpanReporter>,
}

impl Tracer {
    pub fn new(service_name: &str, reporter: Arc<dyn SpanReporter>) -> Self {
        Self {
            service_name: Arc::from(service_name),
            reporter,
        }
    }

    /// A tracer whose spans go nowhere.
    pub fn noop(service_name: &str) -> Self {
        Self::new(service_name, Arc::new(NoopReporter))
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Start a span. With a parent the span joins the parent's trace,
    /// otherwise it starts a new one.
    pub fn start_span(
        &self,
        name: &str,
        kind: SpanKind,
        parent: Option<&TraceContext>,
    ) -> ActiveSpan {
        let (context, parent_span_id) = match parent {
            Some(parent) => (parent.child(), Some(parent.span_id().to_string())),
            None => (TraceContext::new_root(), None),
        };

        ActiveSpan {
            context,
            parent_span_id,
            name: name.to_string(),
            kind,
            service_name: self.service_name.clone(),
            start: SystemTime::now(),
            started: Instant::now(),
            tags: BTreeMap::new(),
            reporter: Some(self.reporter.clone()),
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service_name", &self.service_name)
            .finish()
    }
}

/// An open span. Finished by `end()` or on drop, whichever comes first.
pub struct ActiveSpan {
    context: TraceContext,
    parent_span_id: Option<String>,
    name: String,
    kind: SpanKind,
    service_name: Arc<str>,
    start: SystemTime,
    started: Instant,
    tags: BTreeMap<String, String>,
    reporter: Option<Arc<dyn SpanReporter>>,
}

impl ActiveSpan {
    /// Context to propagate to calls made within this span.
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    pub fn parent_span_id(&self) -> Option<&str> {
        self.parent_span_id.as_deref()
    }

    pub fn set_tag(&mut self, key: &str, value: impl fmt::Display) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.set_tag("http.status_code", status.as_u16());
    }

    pub fn record_error(&mut self, error: &dyn fmt::Display) {
        self.set_tag("error", error);
    }

    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        let Some(reporter) = self.reporter.take() else {
            return;
        };

        reporter.report(FinishedSpan {
            service_name: self.service_name.to_string(),
            name: std::mem::take(&mut self.name),
            kind: self.kind,
            trace_id: self.context.trace_id().to_string(),
            span_id: self.context.span_id().to_string(),
            parent_span_id: self.parent_span_id.take(),
            start: self.start,
            duration: self.started.elapsed(),
            tags: std::mem::take(&mut self.tags),
        });
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

impl fmt::Debug for ActiveSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSpan")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("trace_id", &self.context.trace_id())
            .field("span_id", &self.context.span_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_tracer() -> (Tracer, Arc<InMemoryReporter>) {
        let reporter = Arc::new(InMemoryReporter::new());
        (Tracer::new("service-test", reporter.clone()), reporter)
    }

    #[test]
    fn test_root_span_has_no_parent() {
        let (tracer, reporter) = recording_tracer();
        let span = tracer.start_span("root", SpanKind::Server, None);
        assert!(span.parent_span_id().is_none());
        drop(span);

        let spans = reporter.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "root");
        assert_eq!(spans[0].service_name, "service-test");
        assert!(spans[0].parent_span_id.is_none());
    }

    #[test]
    fn test_child_span_joins_parent_trace() {
        let (tracer, reporter) = recording_tracer();
        let server = tracer.start_span("server", SpanKind::Server, None);
        let client = tracer.start_span("client", SpanKind::Client, Some(server.context()));

        assert_eq!(client.context().trace_id(), server.context().trace_id());
        assert_eq!(client.parent_span_id(), Some(server.context().span_id()));

        client.end();
        server.end();

        let spans = reporter.spans();
        assert_eq!(spans[0].name, "client");
        assert_eq!(spans[0].kind, SpanKind::Client);
        assert_eq!(spans[1].name, "server");
        assert_eq!(spans[0].parent_span_id.as_deref(), Some(spans[1].span_id.as_str()));
    }

    #[test]
    fn test_span_reported_exactly_once() {
        let (tracer, reporter) = recording_tracer();
        let span = tracer.start_span("once", SpanKind::Server, None);
        span.end();
        assert_eq!(reporter.spans().len(), 1);
    }

    #[test]
    fn test_span_closed_on_early_return() {
        fn failing(tracer: &Tracer, input: &str) -> Result<(), String> {
            let mut span = tracer.start_span("failing", SpanKind::Server, None);
            span.set_tag("step", "validate");
            input.parse::<u32>().map_err(|e| e.to_string())?;
            span.end();
            Ok(())
        }

        let (tracer, reporter) = recording_tracer();
        assert!(failing(&tracer, "not a number").is_err());

        let spans = reporter.spans_named("failing");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].tag("step"), Some("validate"));
    }

    #[test]
    fn test_tags_and_status() {
        let (tracer, reporter) = recording_tracer();
        let mut span = tracer.start_span("tagged", SpanKind::Server, None);
        span.set_status(StatusCode::UNPROCESSABLE_ENTITY);
        span.record_error(&"invalid zipcode");
        drop(span);

        let span = &reporter.spans()[0];
        assert_eq!(span.tag("http.status_code"), Some("422"));
        assert_eq!(span.tag("error"), Some("invalid zipcode"));
    }
}
