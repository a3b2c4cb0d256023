//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request headers
//!     → trace_context.rs (extract W3C traceparent / tracestate)
//!     → tracer.rs (server span per handler, client span per outbound call)
//!     → trace_context.rs (inject child context into outbound headers)
//!     → zipkin.rs (finished spans batched and exported)
//!
//! All subsystems also produce:
//!     → logging.rs (structured log events, text or JSON)
//!     → metrics.rs (request / upstream counters and latency)
//! ```
//!
//! # Design Decisions
//! - The tracer is passed explicitly to handlers and clients; there is no
//!   process-global tracer
//! - Every request is sampled
//! - Export failures are logged and never affect request handling

pub mod logging;
pub mod metrics;
pub mod trace_context;
pub mod tracer;
pub mod zipkin;

pub use trace_context::{TraceContext, TraceContextExt, TraceParseError};
pub use tracer::{ActiveSpan, FinishedSpan, InMemoryReporter, NoopReporter, SpanKind, SpanReporter, Tracer};
pub use zipkin::{ExporterError, ExporterHandle, ZipkinReporter};

use std::sync::Arc;

use crate::config::ObservabilityConfig;

/// Build the tracer for `service_name`.
///
/// When tracing is enabled this starts the Zipkin exporter task; the returned
/// handle must be shut down to flush buffered spans. Failure here is fatal to
/// the process.
pub fn init_tracer(
    service_name: &str,
    config: &ObservabilityConfig,
) -> Result<(Tracer, Option<ExporterHandle>), ExporterError> {
    if !config.tracing_enabled {
        tracing::info!(service = service_name, "Span export disabled");
        return Ok((Tracer::noop(service_name), None));
    }

    let (reporter, handle) = zipkin::spawn_exporter(config)?;
    tracing::info!(
        service = service_name,
        endpoint = %config.zipkin_url,
        "Span export to Zipkin enabled"
    );
    Ok((Tracer::new(service_name, Arc::new(reporter)), Some(handle)))
}
