//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request records
//!     → sinks (console, sampled, user-provided)
//!
//! Diagnostics of the crate itself
//!     → tracing events (panics, sink failures, config reloads)
//!     → logging.rs subscriber (stderr, human or JSON)
//! ```
//!
//! # Design Decisions
//! - Request records and diagnostics are separate streams
//! - Diagnostics carry the request ID as a structured field

pub mod logging;

pub use logging::init_logging;
