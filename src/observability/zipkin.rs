//! Zipkin v2 span export.
//!
//! Spans are queued on a bounded channel and posted in batches as JSON
//! (`POST /api/v2/spans`) by a background task. A batch is flushed when it is
//! full, when the export interval elapses, and once more on shutdown.
//!
//! Reporting never blocks a request: when the queue is full the span is
//! dropped and counted. Each export request is bounded by the configured
//! export timeout, so a stalled collector cannot wedge shutdown.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::ObservabilityConfig;
use crate::observability::metrics;
use crate::observability::tracer::{FinishedSpan, SpanKind, SpanReporter};

/// Errors raised while starting the exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("invalid Zipkin endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported Zipkin endpoint scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("failed to build exporter HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Zipkin v2 JSON span.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinSpan {
    pub trace_id: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: SpanKind,
    /// Epoch microseconds.
    pub timestamp: u64,
    /// Microseconds, at least 1.
    pub duration: u64,
    pub local_endpoint: LocalEndpoint,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalEndpoint {
    pub service_name: String,
}

impl From<FinishedSpan> for ZipkinSpan {
    fn from(span: FinishedSpan) -> Self {
        let timestamp = span
            .start
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;

        Self {
            trace_id: span.trace_id,
            id: span.span_id,
            parent_id: span.parent_span_id,
            name: span.name,
            kind: span.kind,
            timestamp,
            duration: (span.duration.as_micros() as u64).max(1),
            local_endpoint: LocalEndpoint {
                service_name: span.service_name,
            },
            tags: span.tags,
        }
    }
}

/// Reporter half of the exporter; cheap to share across requests.
#[derive(Debug, Clone)]
pub struct ZipkinReporter {
    tx: mpsc::Sender<FinishedSpan>,
    dropped: Arc<AtomicU64>,
}

impl ZipkinReporter {
    /// Spans discarded so far because the queue was full or the exporter
    /// had stopped.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl SpanReporter for ZipkinReporter {
    fn report(&self, span: FinishedSpan) {
        let reason = match self.tx.try_send(span) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(_)) => "queue_full",
            Err(mpsc::error::TrySendError::Closed(_)) => "exporter_stopped",
        };

        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_dropped_span(reason);
        // Logged on the first drop and every 1000th after it.
        if total % 1_000 == 1 {
            tracing::warn!(reason, dropped_total = total, "Dropping finished span");
        }
    }
}

/// Controls the background export task.
#[derive(Debug)]
pub struct ExporterHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ExporterHandle {
    /// Flush buffered spans and stop the export task.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Span exporter task failed");
        }
    }
}

/// Validate the endpoint and start the export task.
pub fn spawn_exporter(
    config: &ObservabilityConfig,
) -> Result<(ZipkinReporter, ExporterHandle), ExporterError> {
    let endpoint = url::Url::parse(&config.zipkin_url).map_err(|source| {
        ExporterError::InvalidEndpoint {
            url: config.zipkin_url.clone(),
            source,
        }
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ExporterError::UnsupportedScheme(endpoint.scheme().to_string()));
    }

    let exporter = ZipkinExporter {
        client: reqwest::Client::builder()
            .timeout(Duration::from_millis(config.export_timeout_ms.max(1)))
            .build()?,
        endpoint,
        batch_size: config.export_batch_size.max(1),
        interval: Duration::from_millis(config.export_interval_ms.max(1)),
    };

    let (tx, rx) = mpsc::channel(config.export_queue_size.max(1));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(exporter.run(rx, shutdown_rx));

    Ok((
        ZipkinReporter {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        ExporterHandle {
            shutdown: Some(shutdown_tx),
            task,
        },
    ))
}

struct ZipkinExporter {
    client: reqwest::Client,
    endpoint: url::Url,
    batch_size: usize,
    interval: Duration,
}

impl ZipkinExporter {
    async fn run(
        self,
        mut rx: mpsc::Receiver<FinishedSpan>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(span) => {
                        batch.push(span);
                        if batch.len() >= self.batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    if !batch.is_empty() {
                        self.flush(&mut batch).await;
                    }
                }
                _ = &mut shutdown => {
                    while let Ok(span) = rx.try_recv() {
                        batch.push(span);
                    }
                    break;
                }
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch).await;
        }
        tracing::debug!("Span exporter stopped");
    }

    async fn flush(&self, batch: &mut Vec<FinishedSpan>) {
        let spans: Vec<ZipkinSpan> = batch.drain(..).map(ZipkinSpan::from).collect();
        let count = spans.len();

        match self.client.post(self.endpoint.clone()).json(&spans).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(spans = count, "Exported spans");
            }
            Ok(response) => {
                tracing::warn!(spans = count, status = %response.status(), "Zipkin rejected spans");
            }
            Err(e) => {
                tracing::warn!(spans = count, error = %e, "Failed to export spans");
            }
        }
    }
}
