//! Response body that feeds the recorder.
//!
//! The response head status goes through the recorder when the body is
//! wrapped; every data frame goes through it as hyper pulls the body. The
//! request is finished (record built and dispatched) exactly once: at end of
//! stream, on a body error, or when the body is dropped early because the
//! client disconnected.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::response::Response;
use http_body::{Frame, SizeHint};

use crate::http::recorder::{ResponseRecorder, ResponseWriter};
use crate::pipeline::dispatch::Completion;

/// Holds the frame currently on its way to the server.
#[derive(Debug, Default)]
pub(crate) struct FrameSlot {
    pending: Option<Bytes>,
}

impl ResponseWriter for FrameSlot {
    fn write_header(&mut self, _status: StatusCode) {
        // The head travels in the response parts.
    }

    fn write(&mut self, chunk: Bytes) -> io::Result<usize> {
        let len = chunk.len();
        self.pending = Some(chunk);
        Ok(len)
    }
}

/// Body wrapper that records the response and finishes the request.
pub struct RecordingBody {
    inner: Body,
    recorder: ResponseRecorder<FrameSlot>,
    completion: Option<Completion>,
}

impl RecordingBody {
    /// Route `response` through a recorder that finishes with `completion`.
    pub(crate) fn wrap(response: Response, completion: Completion) -> Response {
        let (parts, inner) = response.into_parts();

        let mut recorder = ResponseRecorder::new(FrameSlot::default());
        recorder.write_header(parts.status);

        let body = RecordingBody {
            inner,
            recorder,
            completion: Some(completion),
        };
        Response::from_parts(parts, Body::new(body))
    }

    fn finish(&mut self) {
        if let Some(completion) = self.completion.take() {
            completion.finish(self.recorder.recorded());
        }
    }
}

impl http_body::Body for RecordingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                let frame = match frame.into_data() {
                    Ok(data) => {
                        this.recorder.write(data).map_err(axum::Error::new)?;
                        let data = this.recorder.get_mut().pending.take().unwrap_or_default();
                        Frame::data(data)
                    }
                    Err(frame) => frame,
                };
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finish();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for RecordingBody {
    fn drop(&mut self) {
        self.finish();
    }
}
