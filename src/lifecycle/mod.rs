//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Init logging → Init tracer/exporter → Bind → Serve
//!
//! Shutdown:
//!     Ctrl+C (signals.rs) → Shutdown::trigger (shutdown.rs)
//!     → server drains → exporter flushes → exit
//! ```
//!
//! Any startup error is fatal; nothing on the request path is.

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
