//! Environment-variable overrides.

use crate::config::loader::ConfigError;
use crate::config::schema::{LogFormat, ServiceConfig};

/// Variable holding the weather API credential.
pub const WEATHERAPI_KEY: &str = "WEATHERAPI_KEY";

/// Abstraction over environment lookups so tests can supply a map instead of
/// mutating the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for std::collections::HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        std::collections::HashMap::get(self, key).cloned()
    }
}

/// Apply overrides (highest priority). Empty values are ignored.
pub fn apply_env_overrides<E: EnvSource>(
    config: &mut ServiceConfig,
    env: &E,
) -> Result<(), ConfigError> {
    if let Some(key) = get_env_string(env, WEATHERAPI_KEY) {
        config.back.weather_api_key = Some(key);
    }

    if let Some(addr) = get_env_string(env, "CEP_FRONT_BIND") {
        config.front.bind_address = addr;
    }
    if let Some(url) = get_env_string(env, "CEP_BACK_SERVICE_URL") {
        config.front.back_service_url = url;
    }

    if let Some(addr) = get_env_string(env, "CEP_BACK_BIND") {
        config.back.bind_address = addr;
    }
    if let Some(url) = get_env_string(env, "CEP_LOCATION_API_URL") {
        config.back.location_api_url = url;
    }
    if let Some(url) = get_env_string(env, "CEP_WEATHER_API_URL") {
        config.back.weather_api_url = url;
    }

    if let Some(url) = get_env_string(env, "CEP_ZIPKIN_URL") {
        config.observability.zipkin_url = url;
    }
    if let Some(level) = get_env_string(env, "CEP_LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = get_env_string(env, "CEP_LOG_FORMAT") {
        config.observability.log_format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" | "pretty" => LogFormat::Text,
            _ => {
                return Err(ConfigError::Env {
                    key: "CEP_LOG_FORMAT",
                    value: format,
                })
            }
        };
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_weather_key_from_env() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(&mut config, &env(&[("WEATHERAPI_KEY", "abc123")])).unwrap();
        assert_eq!(config.back.weather_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_empty_values_ignored() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[("WEATHERAPI_KEY", ""), ("CEP_FRONT_BIND", "   ")]),
        )
        .unwrap();
        assert!(config.back.weather_api_key.is_none());
        assert_eq!(config.front.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_service_overrides() {
        let mut config = ServiceConfig::default();
        apply_env_overrides(
            &mut config,
            &env(&[
                ("CEP_BACK_SERVICE_URL", "http://localhost:9001"),
                ("CEP_LOCATION_API_URL", "http://localhost:9002"),
                ("CEP_WEATHER_API_URL", "http://localhost:9003"),
                ("CEP_LOG_FORMAT", "JSON"),
            ]),
        )
        .unwrap();
        assert_eq!(config.front.back_service_url, "http://localhost:9001");
        assert_eq!(config.back.location_api_url, "http://localhost:9002");
        assert_eq!(config.back.weather_api_url, "http://localhost:9003");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let mut config = ServiceConfig::default();
        let err = apply_env_overrides(&mut config, &env(&[("CEP_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(err.to_string().contains("CEP_LOG_FORMAT"));
    }
}
