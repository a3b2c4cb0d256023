//! HTTP surface of both services.
//!
//! # Data Flow
//! ```text
//! Client
//!     → front.rs  POST /           (validate, call Back Service, relay)
//!     → back.rs   GET /cep/{code}  (validate, directory, weather, convert)
//!     → server.rs (router, HTTP request logging, graceful shutdown)
//! ```

pub mod back;
pub mod front;
pub mod server;

pub use back::BackState;
pub use front::FrontState;
pub use server::{HttpServer, ServiceRole};
