//! Finishing a request: record, decide, dispatch.
//!
//! # Design Decisions
//! - `send` runs as a detached tokio task; nothing awaits or bounds it, so a
//!   burst of requests may have that many sends in flight at once
//! - Panicking requests always dispatch, bypassing every send checker
//! - Sink errors are logged and dropped

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;

use crate::http::recorder::Recorded;
use crate::http::request::RequestHead;
use crate::pipeline::enrich::{prepare_record, should_send};
use crate::pipeline::Features;
use crate::record::Record;
use crate::sink::{Sink, SinkRegistry};

/// Everything needed to finish a request once its response is written.
pub(crate) struct Completion {
    pub(crate) head: RequestHead,
    pub(crate) started: Instant,
    pub(crate) features: Features,
    pub(crate) registry: Arc<SinkRegistry>,
    /// Panic payload when the handler panicked.
    pub(crate) panic: Option<String>,
}

impl Completion {
    /// Build, enrich and, unless suppressed, dispatch the record.
    pub(crate) fn finish(self, response: Recorded) {
        let sink = self.registry.active_sink();
        let mut record = prepare_record(
            sink.as_ref(),
            &self.head,
            &response,
            self.started,
            self.features,
        );
        let request_id = self.head.context.request_id.map(|id| id.to_string());

        match self.panic {
            Some(payload) => {
                if let Some(errored) = record.as_errored() {
                    errored.set_error(payload);
                }
                dispatch(sink, record, request_id);
            }
            None if should_send(sink.as_ref(), record.as_ref()) => {
                dispatch(sink, record, request_id);
            }
            None => {
                tracing::trace!(
                    request_id = request_id.as_deref().unwrap_or_default(),
                    status = response.status,
                    "Request log suppressed by checker"
                );
            }
        }
    }
}

/// Hand `record` to `sink` on a detached task.
pub(crate) fn dispatch(sink: Arc<dyn Sink>, record: Box<dyn Record>, request_id: Option<String>) {
    let Ok(handle) = Handle::try_current() else {
        tracing::warn!(
            request_id = request_id.as_deref().unwrap_or_default(),
            "No async runtime available, dropping request log"
        );
        return;
    };

    handle.spawn(async move {
        if let Err(error) = sink.send(record).await {
            tracing::warn!(
                request_id = request_id.as_deref().unwrap_or_default(),
                %error,
                "Sink failed to deliver request log"
            );
        }
    });
}
