//! Optional enrichment capabilities.
//!
//! Each trait is one narrow thing a record may accept. The pipeline asks for
//! each one separately through the accessor methods on
//! [`Record`](crate::record::Record); a record that supports none of them is
//! still valid and is sent with whatever its sink put in it.

use serde_json::Value;

use crate::record::Record;

/// Accepts the elapsed request time.
pub trait Timed {
    fn set_duration(&mut self, millis: u64);
}

/// Accepts the request ID.
pub trait Identified {
    fn set_request_id(&mut self, id: &str);
}

/// Accepts the route name.
pub trait Named {
    fn set_name(&mut self, name: &str);
}

/// Accepts the opaque route parameters.
pub trait Parameterized {
    fn set_params(&mut self, params: Value);
}

/// Accepts the payload of a handler panic.
pub trait Errored {
    fn set_error(&mut self, error: String);
}

/// Decides whether a fully enriched record is dispatched.
///
/// Not consulted for records of panicking requests: those are always sent.
pub trait SendChecker: Send + Sync {
    fn should_send(&self, record: &dyn Record) -> bool;
}
