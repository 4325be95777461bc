//! Log sinks and the sink registry.
//!
//! # Data Flow
//! ```text
//! startup
//!     → register(name, sink)        (registry.rs)
//!     → select(name)                (active sink swap)
//!
//! per request (pipeline)
//!     → active_sink().new_record()
//!     → active_sink().send(record)  (spawned, never awaited)
//! ```
//!
//! # Design Decisions
//! - Sinks own delivery: the pipeline never retries or escalates `send` errors
//! - `new_record` runs on the request path and must not block on I/O
//! - `send` returns a `'static` future so it can be spawned detached

pub mod console;
pub mod registry;
pub mod sampled;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::config::SinkConfig;
use crate::http::recorder::Recorded;
use crate::http::request::RequestHead;
use crate::record::{Record, SendChecker};

pub use console::{ConsoleFormat, ConsoleSink};
pub use registry::{SinkRegistry, active_sink, register, select};
pub use sampled::SampledSink;

/// Future returned by [`Sink::send`].
pub type SendFuture = Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'static>>;

/// Errors a sink may report from `send`.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Destination for request records.
pub trait Sink: Send + Sync + 'static {
    /// Build the record for one finished request.
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record>;

    /// Deliver a fully enriched record.
    fn send(&self, record: Box<dyn Record>) -> SendFuture;

    /// Sink-level send checker, consulted next to the record's own.
    fn checker(&self) -> Option<&dyn SendChecker> {
        None
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record> {
        (**self).new_record(request, response)
    }

    fn send(&self, record: Box<dyn Record>) -> SendFuture {
        (**self).send(record)
    }

    fn checker(&self) -> Option<&dyn SendChecker> {
        (**self).checker()
    }
}

/// Register the sinks shipped with the crate under their usual names.
///
/// - `console`: stderr in the configured format
/// - `json`: stderr, one JSON object per line
/// - `sampled`: `console` behind the configured sample rate and status floor
pub fn register_builtin(registry: &SinkRegistry, config: &SinkConfig) {
    let console = Arc::new(ConsoleSink::new(config.format).with_dump(config.dump));

    registry.register("console", console.clone());
    registry.register(
        "json",
        Arc::new(ConsoleSink::new(ConsoleFormat::Json).with_dump(config.dump)),
    );
    registry.register(
        "sampled",
        Arc::new(SampledSink::new(console, config.sample_rate).with_min_status(config.min_status)),
    );
}
