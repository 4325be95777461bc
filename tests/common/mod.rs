//! Shared sinks and helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use httplog::http::{Recorded, RequestHead};
use httplog::record::{
    AccessRecord, Errored, Identified, Named, Parameterized, Record, SendChecker, Timed,
};
use httplog::sink::{SendFuture, Sink, SinkError, SinkRegistry};
use serde_json::Value;
use tokio::sync::mpsc;

/// Sink that forwards every sent record, as parsed JSON, to a channel.
pub struct CaptureSink {
    tx: mpsc::UnboundedSender<Value>,
}

impl CaptureSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl Sink for CaptureSink {
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record> {
        Box::new(AccessRecord::from_request(request, response))
    }

    fn send(&self, record: Box<dyn Record>) -> SendFuture {
        let tx = self.tx.clone();
        Box::pin(async move {
            let value: Value = serde_json::from_str(&record.to_json())?;
            tx.send(value)
                .map_err(|_| SinkError::Rejected("receiver dropped".to_string()))
        })
    }
}

/// Record whose own checker answers a fixed verdict.
pub struct GatedRecord {
    inner: AccessRecord,
    verdict: bool,
}

impl Record for GatedRecord {
    fn to_line(&self) -> String {
        self.inner.to_line()
    }

    fn to_json(&self) -> String {
        self.inner.to_json()
    }

    fn status(&self) -> Option<u16> {
        Some(self.inner.status)
    }

    fn as_timed(&mut self) -> Option<&mut dyn Timed> {
        Some(&mut self.inner)
    }

    fn as_identified(&mut self) -> Option<&mut dyn Identified> {
        Some(&mut self.inner)
    }

    fn as_named(&mut self) -> Option<&mut dyn Named> {
        Some(&mut self.inner)
    }

    fn as_parameterized(&mut self) -> Option<&mut dyn Parameterized> {
        Some(&mut self.inner)
    }

    fn as_errored(&mut self) -> Option<&mut dyn Errored> {
        Some(&mut self.inner)
    }

    fn as_checker(&self) -> Option<&dyn SendChecker> {
        Some(self)
    }
}

impl SendChecker for GatedRecord {
    fn should_send(&self, _record: &dyn Record) -> bool {
        self.verdict
    }
}

/// Capture sink whose records carry a fixed checker verdict.
pub struct GatedSink {
    capture: Arc<CaptureSink>,
    verdict: bool,
}

impl GatedSink {
    pub fn new(verdict: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<Value>) {
        let (capture, rx) = CaptureSink::new();
        (Arc::new(Self { capture, verdict }), rx)
    }
}

impl Sink for GatedSink {
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record> {
        Box::new(GatedRecord {
            inner: AccessRecord::from_request(request, response),
            verdict: self.verdict,
        })
    }

    fn send(&self, record: Box<dyn Record>) -> SendFuture {
        self.capture.send(record)
    }
}

/// Sink that counts send attempts and fails every one of them.
#[derive(Default)]
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

impl Sink for FailingSink {
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record> {
        Box::new(AccessRecord::from_request(request, response))
    }

    fn send(&self, _record: Box<dyn Record>) -> SendFuture {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(SinkError::Rejected("backend unavailable".to_string())) })
    }
}

/// Fresh registry with `sink` registered as "capture" and selected.
pub fn registry_with(sink: Arc<dyn Sink>) -> Arc<SinkRegistry> {
    let registry = Arc::new(SinkRegistry::new());
    registry.register("capture", sink);
    assert!(registry.select("capture"));
    registry
}

/// Wait for the next dispatched record.
pub async fn next_record(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a record")
        .expect("capture channel closed")
}

/// Assert nothing is dispatched for a short while.
pub async fn assert_no_record(rx: &mut mpsc::UnboundedReceiver<Value>) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    // A closed channel means the sink is gone and nothing more can arrive.
    assert!(matches!(outcome, Err(_) | Ok(None)), "unexpected record: {:?}", outcome);
}
