//! Log records.
//!
//! # Data Flow
//! ```text
//! active sink
//!     → Sink::new_record(request head, recorded response)
//!     → capability.rs setters (duration, request ID, name, params, error)
//!     → SendChecker (normal path only)
//!     → Sink::send
//! ```
//!
//! # Design Decisions
//! - Sinks choose their own record shape; `AccessRecord` is the base one
//! - Capabilities are probed one by one instead of a fixed schema
//! - Rendering never fails: encoding errors become an inline error payload

pub mod access;
pub mod capability;

pub use access::AccessRecord;
pub use capability::{Errored, Identified, Named, Parameterized, SendChecker, Timed};

/// A per-request log entry.
///
/// Only the two renderings are mandatory. Every `as_*` accessor defaults to
/// `None`; override the ones the record supports by returning `Some(self)`.
pub trait Record: Send + 'static {
    /// Fixed-order, human-readable line.
    fn to_line(&self) -> String;

    /// Structured key/value encoding with unset optional fields omitted.
    fn to_json(&self) -> String;

    /// Response status carried by the record, for checkers that filter on it.
    fn status(&self) -> Option<u16> {
        None
    }

    fn as_timed(&mut self) -> Option<&mut dyn Timed> {
        None
    }

    fn as_identified(&mut self) -> Option<&mut dyn Identified> {
        None
    }

    fn as_named(&mut self) -> Option<&mut dyn Named> {
        None
    }

    fn as_parameterized(&mut self) -> Option<&mut dyn Parameterized> {
        None
    }

    fn as_errored(&mut self) -> Option<&mut dyn Errored> {
        None
    }

    fn as_checker(&self) -> Option<&dyn SendChecker> {
        None
    }
}
