//! CEP → temperature services.
//!
//! Two chained HTTP services sharing one library:
//! - the Front Service validates `{"cep": "..."}` and delegates,
//! - the Back Service resolves the CEP to a city, the city to a temperature,
//!   and reports it in Celsius, Fahrenheit and Kelvin.
//!
//! A W3C trace context follows each request across both hops and out to the
//! two external APIs.

pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError};
pub use http::{HttpServer, ServiceRole};
pub use lifecycle::Shutdown;
