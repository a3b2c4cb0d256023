//! Outbound HTTP clients.
//!
//! # Data Flow
//! ```text
//! Front Service
//!     → back_service.rs (GET {back}/cep/{code})
//!
//! Back Service
//!     → location.rs (GET {directory}/ws/{code}/json/ → city)
//!     → weather.rs  (GET {weather}/v1/current.json?key=&q= → Celsius)
//! ```
//!
//! # Design Decisions
//! - Each call runs in its own client span and carries that span's context
//!   in `traceparent`
//! - No retries and no timeouts: one failed call fails the request, a hung
//!   call hangs it
//! - Every error type keeps enough detail for logs; handlers decide what the
//!   client sees

pub mod back_service;
pub mod location;
pub mod weather;

pub use back_service::{BackServiceClient, BackServiceError};
pub use location::{LocationClient, LocationError};
pub use weather::{WeatherClient, WeatherError};

/// Build the shared HTTP client. No request timeout is set.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().build()
}
