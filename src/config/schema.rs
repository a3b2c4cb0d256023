//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};

/// Root configuration shared by both services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Front Service (client-facing) settings.
    pub front: FrontConfig,

    /// Back Service (lookup orchestration) settings.
    pub back: BackConfig,

    /// Logging, span export and metrics.
    pub observability: ObservabilityConfig,
}

/// Front Service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrontConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the Back Service.
    pub back_service_url: String,
}

impl Default for FrontConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            back_service_url: "http://service-b:8081".to_string(),
        }
    }
}

/// Back Service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// Base URL of the postal-code directory API.
    pub location_api_url: String,

    /// Base URL of the weather API.
    pub weather_api_url: String,

    /// Weather API credential, normally from `WEATHERAPI_KEY`.
    #[serde(skip_serializing)]
    pub weather_api_key: Option<String>,
}

impl Default for BackConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            location_api_url: "https://viacep.com.br".to_string(),
            weather_api_url: "http://api.weatherapi.com".to_string(),
            weather_api_key: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Export spans to Zipkin.
    pub tracing_enabled: bool,

    /// Zipkin v2 span collection endpoint.
    pub zipkin_url: String,

    /// Spans per export request.
    pub export_batch_size: usize,

    /// Maximum time a span waits in the export buffer, in milliseconds.
    pub export_interval_ms: u64,

    /// Finished spans buffered ahead of the exporter. Spans reported while
    /// the queue is full are dropped.
    pub export_queue_size: usize,

    /// Upper bound on one export request, in milliseconds.
    pub export_timeout_ms: u64,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            tracing_enabled: true,
            zipkin_url: "http://zipkin:9411/api/v2/spans".to_string(),
            export_batch_size: 512,
            export_interval_ms: 5_000,
            export_queue_size: 2_048,
            export_timeout_ms: 30_000,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = ServiceConfig::default();
        assert_eq!(config.front.bind_address, "0.0.0.0:8080");
        assert_eq!(config.back.bind_address, "0.0.0.0:8081");
        assert_eq!(config.front.back_service_url, "http://service-b:8081");
        assert_eq!(config.observability.zipkin_url, "http://zipkin:9411/api/v2/spans");
        assert!(config.back.weather_api_key.is_none());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = ServiceConfig::default();
        config.back.weather_api_key = Some("secret".to_string());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }
}
