//! Postal-code directory lookup (CEP → city).

use std::time::Instant;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Cep;
use crate::observability::metrics;
use crate::observability::{ActiveSpan, SpanKind, TraceContext, TraceContextExt, Tracer};

/// Ways a directory lookup can fail. All of them mean "not found" to clients.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("directory request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("directory returned status {0}")]
    Status(StatusCode),

    #[error("directory response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("directory returned no city")]
    EmptyCity,
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    localidade: Option<String>,
}

/// Client for the directory API.
#[derive(Debug, Clone)]
pub struct LocationClient {
    http: reqwest::Client,
    base_url: String,
    tracer: Tracer,
}

impl LocationClient {
    pub fn new(http: reqwest::Client, base_url: &str, tracer: Tracer) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tracer,
        }
    }

    pub fn lookup_url(&self, cep: &Cep) -> String {
        format!("{}/ws/{}/json/", self.base_url, cep)
    }

    /// Resolve `cep` to a non-empty city name.
    pub async fn fetch_city(&self, cep: &Cep, parent: &TraceContext) -> Result<String, LocationError> {
        let mut span = self
            .tracer
            .start_span("fetch_location", SpanKind::Client, Some(parent));
        let url = self.lookup_url(cep);
        span.set_tag("http.method", "GET");
        span.set_tag("http.url", &url);

        let start = Instant::now();
        let result = self.request(&url, &mut span).await;
        match &result {
            Ok(city) => {
                span.set_tag("cep.city", city);
                metrics::record_upstream("location", "ok", start);
            }
            Err(e) => {
                span.record_error(e);
                metrics::record_upstream("location", "error", start);
            }
        }
        result
    }

    async fn request(&self, url: &str, span: &mut ActiveSpan) -> Result<String, LocationError> {
        let response = self
            .http
            .get(url)
            .trace_context(span.context())
            .send()
            .await
            .map_err(LocationError::Transport)?;

        let status = response.status();
        span.set_status(status);
        if status != StatusCode::OK {
            return Err(LocationError::Status(status));
        }

        let body: DirectoryResponse = response.json().await.map_err(LocationError::Decode)?;
        body.localidade
            .filter(|city| !city.is_empty())
            .ok_or(LocationError::EmptyCity)
    }
}
