//! Response recorder.
//!
//! # Responsibilities
//! - Observe the status code written for a response
//! - Count the bytes written to the response body
//! - Forward every call to the wrapped writer unchanged
//!
//! # Design Decisions
//! - A body write without a prior header write implies `200 OK`
//! - Errors from the wrapped writer are returned as-is, never swallowed

use std::io;

use axum::body::Bytes;
use axum::http::StatusCode;

/// Write side of an HTTP response.
pub trait ResponseWriter {
    /// Send the response status.
    fn write_header(&mut self, status: StatusCode);

    /// Send a chunk of the response body, returning how many bytes went out.
    fn write(&mut self, chunk: Bytes) -> io::Result<usize>;
}

/// What a recorder observed, handed to sinks when building a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Recorded {
    /// Response status, `0` when nothing was written.
    pub status: u16,
    /// Total body bytes written.
    pub length: usize,
}

/// Wraps a [`ResponseWriter`] and records status and body length.
#[derive(Debug)]
pub struct ResponseRecorder<W> {
    inner: W,
    status: Option<StatusCode>,
    length: usize,
}

impl<W> ResponseRecorder<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            status: None,
            length: 0,
        }
    }

    /// Status written so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Body bytes written so far.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn recorded(&self) -> Recorded {
        Recorded {
            status: self.status.map_or(0, |s| s.as_u16()),
            length: self.length,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for ResponseRecorder<W> {
    fn write_header(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.inner.write_header(status);
    }

    fn write(&mut self, chunk: Bytes) -> io::Result<usize> {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        let written = self.inner.write(chunk)?;
        self.length += written;
        Ok(written)
    }
}
