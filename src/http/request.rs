//! Request-scoped logging context.
//!
//! # Responsibilities
//! - Generate or propagate the per-request ID
//! - Carry route name and route params through request extensions
//! - Snapshot the request head so a record can be built after the handler
//!   has consumed the request
//!
//! # Design Decisions
//! - Context slots are typed extensions, not a string-keyed bag
//! - Slots are written once at pipeline entry and read-only afterwards
//! - Bodies are never buffered; the dump covers the request line and headers

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap, Method, Request, Uri, Version, header};
use serde_json::Value;
use uuid::Uuid;

/// Default header used to propagate and expose request IDs.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Longest incoming request ID accepted for propagation.
const MAX_PROPAGATED_ID_LEN: usize = 128;

/// Unique identifier of a single request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh UUID v4 identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept an incoming header value as a request ID.
    ///
    /// Only short, printable tokens are accepted so a client cannot inject
    /// log-breaking content through the header.
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.len() > MAX_PROPAGATED_ID_LEN {
            return None;
        }
        let valid = value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'));
        valid.then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Route name written by an outer wrapper before the handler runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteName(String);

impl RouteName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque route parameters written by upstream routing.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteParams(pub Value);

/// Read-only view of the three context slots of a request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogContext {
    pub request_id: Option<RequestId>,
    pub route_name: Option<String>,
    pub params: Option<Value>,
}

impl LogContext {
    pub fn from_extensions(extensions: &Extensions) -> Self {
        Self {
            request_id: extensions.get::<RequestId>().cloned(),
            route_name: extensions.get::<RouteName>().map(|n| n.as_str().to_string()),
            params: extensions.get::<RouteParams>().map(|p| p.0.clone()),
        }
    }
}

/// Accessors for the logging context on a request.
pub trait RequestIdExt {
    /// The request ID assigned by the logging layer, if any.
    fn request_id(&self) -> Option<&RequestId>;

    /// A copy of all context slots.
    fn log_context(&self) -> LogContext;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&RequestId> {
        self.extensions().get::<RequestId>()
    }

    fn log_context(&self) -> LogContext {
        LogContext::from_extensions(self.extensions())
    }
}

/// Everything about the request a sink may need once the handler is done.
#[derive(Clone, Debug)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub peer_addr: Option<SocketAddr>,
    pub context: LogContext,
}

impl RequestHead {
    /// Snapshot the head of `req`, including the context slots written so far.
    pub fn capture<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            headers: req.headers().clone(),
            peer_addr: req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0),
            context: LogContext::from_extensions(req.extensions()),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or_default()
    }

    pub fn user_agent(&self) -> &str {
        self.header_str(header::USER_AGENT.as_str()).unwrap_or_default()
    }

    /// Best guess at the client address.
    ///
    /// Takes the first public hop of `X-Forwarded-For`, then `X-Real-IP`,
    /// then the peer address. Empty when none is known.
    pub fn remote_ip(&self) -> String {
        let forwarded = self.header_str("x-forwarded-for").and_then(|v| {
            v.split(',')
                .map(str::trim)
                .find(|hop| hop.parse::<IpAddr>().is_ok_and(|ip| !is_private(ip)))
        });
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        if let Some(ip) = self.header_str("x-real-ip").map(str::trim).filter(|v| !v.is_empty()) {
            return ip.to_string();
        }

        self.peer_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }

    /// Request line and headers in HTTP/1.1 wire form.
    pub fn dump(&self) -> String {
        let target = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let mut out = format!("{} {} {:?}\r\n", self.method, target, self.version);
        if !self.headers.contains_key(header::HOST) {
            if let Some(host) = self.uri.authority() {
                out.push_str(&format!("host: {}\r\n", host));
            }
        }
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes())));
        }
        out.push_str("\r\n");
        out
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Loopback, link-local, private, shared (CGNAT) and unique-local ranges.
fn is_private(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || (a == 100 && (64..128).contains(&b))
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}
