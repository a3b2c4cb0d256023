//! Request-scoped domain types.
//!
//! # Data Flow
//! ```text
//! untrusted client input
//!     → cep.rs (8-digit validation, Cep newtype)
//!     → [directory + weather lookups] (clients)
//!     → temperature.rs (unit conversion, TemperatureReport)
//!     → serialized as the response body
//! ```
//!
//! # Design Decisions
//! - Nothing here performs I/O; every function is pure
//! - Both services link the same validator and each calls it independently

pub mod cep;
pub mod temperature;

pub use cep::{is_valid_cep, Cep};
pub use temperature::{celsius_to_fahrenheit, celsius_to_kelvin, round_one_decimal, TemperatureReport};
