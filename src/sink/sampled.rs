//! Sampling wrapper for any sink.

use crate::http::recorder::Recorded;
use crate::http::request::RequestHead;
use crate::record::{Record, SendChecker};
use crate::sink::{SendFuture, Sink};

/// Forwards a fraction of records to the wrapped sink.
///
/// Records at or above `min_status` are always kept; the rest are kept with
/// probability `sample_rate`. Records of panicking requests never reach the
/// checker and are always forwarded.
#[derive(Debug, Clone)]
pub struct SampledSink<S> {
    inner: S,
    sample_rate: f64,
    min_status: Option<u16>,
}

impl<S> SampledSink<S> {
    pub fn new(inner: S, sample_rate: f64) -> Self {
        Self {
            inner,
            sample_rate: sample_rate.clamp(0.0, 1.0),
            min_status: None,
        }
    }

    /// Always keep records whose status is at least `min_status`.
    pub fn with_min_status(mut self, min_status: Option<u16>) -> Self {
        self.min_status = min_status;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Send + Sync> SendChecker for SampledSink<S> {
    fn should_send(&self, record: &dyn Record) -> bool {
        let above_floor = match (self.min_status, record.status()) {
            (Some(floor), Some(status)) => status >= floor,
            _ => false,
        };
        above_floor || fastrand::f64() < self.sample_rate
    }
}

impl<S: Sink> Sink for SampledSink<S> {
    fn new_record(&self, request: &RequestHead, response: &Recorded) -> Box<dyn Record> {
        self.inner.new_record(request, response)
    }

    fn send(&self, record: Box<dyn Record>) -> SendFuture {
        self.inner.send(record)
    }

    fn checker(&self) -> Option<&dyn SendChecker> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AccessRecord;
    use crate::sink::ConsoleSink;

    fn record(status: u16) -> AccessRecord {
        AccessRecord {
            status,
            ..AccessRecord::default()
        }
    }

    #[test]
    fn test_rate_bounds() {
        let never = SampledSink::new(ConsoleSink::default(), 0.0);
        let always = SampledSink::new(ConsoleSink::default(), 1.0);
        for _ in 0..100 {
            assert!(!never.should_send(&record(200)));
            assert!(always.should_send(&record(200)));
        }
    }

    #[test]
    fn test_status_floor_bypasses_sampling() {
        let sink = SampledSink::new(ConsoleSink::default(), 0.0).with_min_status(Some(500));
        assert!(sink.should_send(&record(503)));
        assert!(!sink.should_send(&record(404)));
    }

    #[test]
    fn test_rate_is_clamped() {
        let sink = SampledSink::new(ConsoleSink::default(), 7.5);
        assert_eq!(sink.sample_rate, 1.0);
        assert!(sink.checker().is_some());
    }
}
