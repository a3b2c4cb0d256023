//! Temperature conversion and the composed report.

use serde::{Deserialize, Serialize};

/// Convert Celsius to Fahrenheit (unrounded).
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 1.8 + 32.0
}

/// Convert Celsius to Kelvin (unrounded).
///
/// Uses the integer offset 273, not 273.15.
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + 273.0
}

/// Round to one decimal place, halves away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Response body shared by both services.
///
/// `temp_c` is reported exactly as the weather API returned it; only the
/// derived scales are rounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl TemperatureReport {
    pub fn from_celsius(city: impl Into<String>, celsius: f64) -> Self {
        Self {
            city: city.into(),
            temp_c: celsius,
            temp_f: round_one_decimal(celsius_to_fahrenheit(celsius)),
            temp_k: round_one_decimal(celsius_to_kelvin(celsius)),
        }
    }
}
