//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides (env.rs, highest priority)
//!     → validation.rs (semantic checks, all errors reported)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Every field has a default so both services start with no config file
//! - The weather API key is only ever expected from the environment in
//!   deployments; a missing key is a per-request error, not a startup error
//! - There is no timeout setting: outbound calls wait indefinitely

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, EnvSource, ProcessEnv};
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BackConfig, FrontConfig, LogFormat, ObservabilityConfig, ServiceConfig};
pub use validation::{validate_config, ValidationError};
