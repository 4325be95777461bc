//! Console sink, the default destination.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::http::recorder::Recorded;
use crate::http::request::RequestHead;
use crate::record::{AccessRecord, Record};
use crate::sink::{SendFuture, Sink, SinkError};

/// Rendering used by [`ConsoleSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    /// Fixed-order human-readable line.
    #[default]
    Line,
    /// One JSON object per line.
    Json,
}

/// Writes one record per line to stderr.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    format: ConsoleFormat,
    dump: bool,
}

impl ConsoleSink {
    pub fn new(format: ConsoleFormat) -> Self {
        Self { format, dump: false }
    }

    /// Include the raw request line and headers in every record.
    pub fn with_dump(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }

    pub fn format(&self) -> ConsoleFormat {
        self.format
    }

    fn render(&self, record: &dyn Record) -> String {
        match self.format {
            ConsoleFormat::Line => record.to_line(),
            ConsoleFormat::Json => record.to_json(),
        }
    }
}

impl Sink for ConsoleSink {
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record> {
        let record = AccessRecord::from_request(request, response);
        if self.dump {
            Box::new(record.with_dump(request))
        } else {
            Box::new(record)
        }
    }

    fn send(&self, record: Box<dyn Record>) -> SendFuture {
        let line = self.render(record.as_ref());
        Box::pin(async move {
            // One locked write per record keeps concurrent lines whole.
            let mut out = std::io::stderr().lock();
            writeln!(out, "{line}").map_err(SinkError::Io)
        })
    }
}
