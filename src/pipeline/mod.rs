//! Request interception pipeline.
//!
//! # Data Flow
//! ```text
//! Start            entry timestamp, features loaded
//!     → request ID assigned into extensions (REQUEST_ID)
//!     → handler runs (panics caught, turned into a 500)
//!     → response body streams through the recorder
//!     → end of body: record built by the active sink (enrich.rs)
//!     → send checker consulted (skipped after a panic)
//!     → Sink::send spawned (dispatch.rs)
//! ```
//!
//! The tower layer that drives this lives in [`crate::http::layer`].
//!
//! # Design Decisions
//! - Feature flags are read once at entry and used for the whole request
//! - The active sink is read when the record is built and used for both
//!   `new_record` and `send`
//! - Dispatch happens after the last body byte left the server, so logging
//!   never adds client-observed latency

pub(crate) mod dispatch;
pub mod enrich;
pub mod features;

pub use enrich::{prepare_record, should_send};
pub use features::Features;
