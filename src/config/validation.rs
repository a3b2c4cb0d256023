//! Configuration validation.
//!
//! Semantic checks only (serde handles syntax). Returns every problem found,
//! not just the first.

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::filter::LevelFilter;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "front.bind_address", &config.front.bind_address);
    check_http_url(&mut errors, "front.back_service_url", &config.front.back_service_url);

    check_socket_addr(&mut errors, "back.bind_address", &config.back.bind_address);
    check_http_url(&mut errors, "back.location_api_url", &config.back.location_api_url);
    check_http_url(&mut errors, "back.weather_api_url", &config.back.weather_api_url);

    let obs = &config.observability;
    if obs.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!("unknown level '{}'", obs.log_level),
        });
    }
    if obs.tracing_enabled {
        check_http_url(&mut errors, "observability.zipkin_url", &obs.zipkin_url);
        if obs.export_batch_size == 0 {
            errors.push(ValidationError {
                field: "observability.export_batch_size",
                message: "must be greater than 0".to_string(),
            });
        }
        for (field, value) in [
            ("observability.export_interval_ms", obs.export_interval_ms),
            ("observability.export_queue_size", obs.export_queue_size as u64),
            ("observability.export_timeout_ms", obs.export_timeout_ms),
        ] {
            if value == 0 {
                errors.push(ValidationError {
                    field,
                    message: "must be greater than 0".to_string(),
                });
            }
        }
    }
    if obs.metrics_enabled {
        check_socket_addr(&mut errors, "observability.metrics_address", &obs.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError {
            field,
            message: format!("'{value}' is not a socket address: {e}"),
        });
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {}
        Ok(url) => errors.push(ValidationError {
            field,
            message: format!("'{value}' must be an http(s) URL with a host (got scheme '{}')", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field,
            message: format!("'{value}' is not a valid URL: {e}"),
        }),
    }
}
