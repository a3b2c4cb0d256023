//! Weather lookup (city → current Celsius temperature).

use std::time::Instant;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::observability::{ActiveSpan, SpanKind, TraceContext, TraceContextExt, Tracer};

/// Ways a weather lookup can fail.
///
/// Messages are shown to clients verbatim, so request URLs (which contain the
/// API key) are stripped from transport errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("missing WEATHERAPI_KEY")]
    MissingApiKey,

    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to fetch temperature")]
    Status(StatusCode),

    #[error("{0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
}

/// Client for the weather API.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    tracer: Tracer,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>, tracer: Tracer) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            tracer,
        }
    }

    /// Current temperature for `city`, in Celsius, exactly as reported.
    ///
    /// A missing API key fails before any network traffic.
    pub async fn fetch_celsius(&self, city: &str, parent: &TraceContext) -> Result<f64, WeatherError> {
        let mut span = self
            .tracer
            .start_span("fetch_temperature", SpanKind::Client, Some(parent));
        span.set_tag("http.method", "GET");
        span.set_tag("weather.city", city);

        let start = Instant::now();
        let result = match self.api_key.as_deref() {
            Some(key) => self.request(key, city, &mut span).await,
            None => Err(WeatherError::MissingApiKey),
        };
        match &result {
            Ok(celsius) => {
                span.set_tag("weather.temp_c", celsius);
                metrics::record_upstream("weather", "ok", start);
            }
            Err(e) => {
                span.record_error(e);
                metrics::record_upstream("weather", "error", start);
            }
        }
        result
    }

    async fn request(&self, key: &str, city: &str, span: &mut ActiveSpan) -> Result<f64, WeatherError> {
        let url = format!("{}/v1/current.json", self.base_url);
        span.set_tag("http.url", &url);

        let response = self
            .http
            .get(&url)
            .query(&[("key", key), ("q", city)])
            .trace_context(span.context())
            .send()
            .await
            .map_err(|e| WeatherError::Transport(e.without_url()))?;

        let status = response.status();
        span.set_status(status);
        if status != StatusCode::OK {
            return Err(WeatherError::Status(status));
        }

        let body: CurrentWeatherResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(e.without_url()))?;
        Ok(body.current.temp_c)
    }
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
