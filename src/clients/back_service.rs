//! Front → Back Service call.

use std::time::Instant;

use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::{Cep, TemperatureReport};
use crate::observability::metrics;
use crate::observability::{ActiveSpan, SpanKind, TraceContext, TraceContextExt, Tracer};

/// Failure talking to the Back Service. The message is relayed to clients.
#[derive(Debug, Error)]
pub enum BackServiceError {
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// Non-200 answer; `message` is the Back Service's own error text.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Decode(#[source] reqwest::Error),
}

/// Client for the Back Service.
#[derive(Debug, Clone)]
pub struct BackServiceClient {
    http: reqwest::Client,
    base_url: String,
    tracer: Tracer,
}

impl BackServiceClient {
    pub fn new(http: reqwest::Client, base_url: &str, tracer: Tracer) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tracer,
        }
    }

    pub fn report_url(&self, cep: &Cep) -> String {
        format!("{}/cep/{}", self.base_url, cep)
    }

    /// Fetch the temperature report for `cep`, unmodified.
    pub async fn fetch_report(
        &self,
        cep: &Cep,
        parent: &TraceContext,
    ) -> Result<TemperatureReport, BackServiceError> {
        let mut span = self
            .tracer
            .start_span("fetch_temperature_by_cep", SpanKind::Client, Some(parent));
        let url = self.report_url(cep);
        span.set_tag("http.method", "GET");
        span.set_tag("http.url", &url);

        let start = Instant::now();
        let result = self.request(cep, &url, &mut span).await;
        match &result {
            Ok(_) => metrics::record_upstream("back_service", "ok", start),
            Err(e) => {
                span.record_error(e);
                metrics::record_upstream("back_service", "error", start);
            }
        }
        result
    }

    async fn request(
        &self,
        cep: &Cep,
        url: &str,
        span: &mut ActiveSpan,
    ) -> Result<TemperatureReport, BackServiceError> {
        let response = self
            .http
            .get(url)
            .trace_context(span.context())
            .send()
            .await
            .map_err(BackServiceError::Transport)?;

        let status = response.status();
        span.set_status(status);
        if status != StatusCode::OK {
            tracing::warn!(cep = %cep, status = %status, "Back Service returned an error");
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                format!("can not fetch temperature by CEP: {cep}")
            } else {
                body
            };
            return Err(BackServiceError::Status { status, message });
        }

        response.json().await.map_err(BackServiceError::Decode)
    }
}
