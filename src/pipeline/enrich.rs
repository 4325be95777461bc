//! Record construction and capability enrichment.

use std::time::Instant;

use crate::http::recorder::Recorded;
use crate::http::request::RequestHead;
use crate::pipeline::Features;
use crate::record::Record;
use crate::sink::Sink;

/// Build the record for a finished request and run the enabled setters.
///
/// Order is duration, request ID, name, params. Each step only runs when its
/// feature flag is on and the record supports the capability.
pub fn prepare_record(
    sink: &dyn Sink,
    head: &RequestHead,
    response: &Recorded,
    started: Instant,
    features: Features,
) -> Box<dyn Record> {
    let mut record = sink.new_record(head, response);

    if features.contains(Features::DURATION) {
        if let Some(timed) = record.as_timed() {
            let millis = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            timed.set_duration(millis);
        }
    }

    if features.contains(Features::REQUEST_ID) {
        if let Some(identified) = record.as_identified() {
            match &head.context.request_id {
                Some(id) => identified.set_request_id(id.as_str()),
                None => tracing::debug!(
                    path = %head.path(),
                    "Request ID enabled but missing from context, field left empty"
                ),
            }
        }
    }

    if features.contains(Features::NAME) {
        if let (Some(named), Some(name)) = (record.as_named(), &head.context.route_name) {
            named.set_name(name);
        }
    }

    if features.contains(Features::PARAMS) {
        if let (Some(parameterized), Some(params)) =
            (record.as_parameterized(), &head.context.params)
        {
            parameterized.set_params(params.clone());
        }
    }

    record
}

/// Whether every checker present on the record and the sink agrees to send.
pub fn should_send(sink: &dyn Sink, record: &dyn Record) -> bool {
    let record_allows = record
        .as_checker()
        .map_or(true, |checker| checker.should_send(record));
    record_allows && sink.checker().map_or(true, |checker| checker.should_send(record))
}
