//! Base access-log record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::http::recorder::Recorded;
use crate::http::request::RequestHead;
use crate::record::capability::{Errored, Identified, Named, Parameterized, Timed};
use crate::record::Record;

/// Timestamp prefix of the line rendering.
pub const LINE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// The default record shape: one line per request, Apache-style.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccessRecord {
    /// When the record was built.
    pub time: DateTime<Utc>,
    /// Elapsed time in milliseconds.
    pub duration: u64,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query_string: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    pub status: u16,
    pub content_length: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub route_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Raw request line and headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccessRecord {
    /// Populate the fields known from the request head and the response.
    ///
    /// Context slots are left for the pipeline to fill through the
    /// capability setters.
    pub fn from_request(head: &RequestHead, response: &Recorded) -> Self {
        Self {
            time: Utc::now(),
            method: head.method.to_string(),
            path: head.path().to_string(),
            query_string: head.query().to_string(),
            remote_ip: head.remote_ip(),
            user_agent: head.user_agent().to_string(),
            status: response.status,
            content_length: response.length,
            ..Self::default()
        }
    }

    /// Attach the raw request dump.
    pub fn with_dump(mut self, head: &RequestHead) -> Self {
        self.dump = Some(head.dump());
        self
    }
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] [{}] {} - {} {} {} - {} {} \"{}\" \"{}\" - \"{}\"",
            self.time.format(LINE_TIME_FORMAT),
            self.request_id,
            self.route_name,
            self.remote_ip,
            self.status,
            self.duration,
            self.content_length,
            self.method,
            self.path,
            self.query_string,
            self.user_agent,
            self.error.as_deref().unwrap_or_default(),
        )
    }
}

impl Record for AccessRecord {
    fn to_line(&self) -> String {
        self.to_string()
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }

    fn status(&self) -> Option<u16> {
        Some(self.status)
    }

    fn as_timed(&mut self) -> Option<&mut dyn Timed> {
        Some(self)
    }

    fn as_identified(&mut self) -> Option<&mut dyn Identified> {
        Some(self)
    }

    fn as_named(&mut self) -> Option<&mut dyn Named> {
        Some(self)
    }

    fn as_parameterized(&mut self) -> Option<&mut dyn Parameterized> {
        Some(self)
    }

    fn as_errored(&mut self) -> Option<&mut dyn Errored> {
        Some(self)
    }
}

impl Timed for AccessRecord {
    fn set_duration(&mut self, millis: u64) {
        self.duration = millis;
    }
}

impl Identified for AccessRecord {
    fn set_request_id(&mut self, id: &str) {
        self.request_id = id.to_string();
    }
}

impl Named for AccessRecord {
    fn set_name(&mut self, name: &str) {
        self.route_name = name.to_string();
    }
}

impl Parameterized for AccessRecord {
    fn set_params(&mut self, params: Value) {
        self.params = Some(params);
    }
}

impl Errored for AccessRecord {
    fn set_error(&mut self, error: String) {
        self.error = Some(error);
    }
}
