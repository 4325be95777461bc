//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML and every
//! field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::http::request::X_REQUEST_ID;
use crate::pipeline::Features;
use crate::sink::ConsoleFormat;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Demo server settings.
    pub server: ServerConfig,

    /// Sink selection and built-in sink settings.
    pub sink: SinkConfig,

    /// Enrichment feature flags.
    pub features: FeatureConfig,

    /// Request ID generation and propagation.
    pub request_id: RequestIdConfig,

    /// Diagnostics of the crate itself.
    pub logging: LoggingConfig,
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SinkConfig {
    /// Registered name of the sink to make active.
    pub active: String,

    /// Rendering of the console sink.
    pub format: ConsoleFormat,

    /// Include the raw request line and headers in records.
    pub dump: bool,

    /// Fraction of records kept by the `sampled` sink (0.0 - 1.0).
    pub sample_rate: f64,

    /// Status at or above which the `sampled` sink keeps every record.
    pub min_status: Option<u16>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            active: "console".to_string(),
            format: ConsoleFormat::Line,
            dump: false,
            sample_rate: 1.0,
            min_status: None,
        }
    }
}

/// Enrichment feature flags.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub request_id: bool,
    pub duration: bool,
    pub name: bool,
    pub params: bool,

    /// Fill route params from matched path parameters.
    pub capture_path_params: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            request_id: true,
            duration: true,
            name: true,
            params: true,
            capture_path_params: false,
        }
    }
}

impl FeatureConfig {
    pub fn to_features(&self) -> Features {
        let mut features = Features::NONE;
        features.set(Features::REQUEST_ID, self.request_id);
        features.set(Features::DURATION, self.duration);
        features.set(Features::NAME, self.name);
        features.set(Features::PARAMS, self.params);
        features
    }
}

/// Request ID configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RequestIdConfig {
    /// Header used to propagate and expose the ID.
    pub header: String,

    /// Reuse a valid incoming ID instead of generating one.
    pub trust_incoming_header: bool,

    /// Echo the ID on responses.
    pub expose_header: bool,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            header: X_REQUEST_ID.to_string(),
            trust_incoming_header: false,
            expose_header: false,
        }
    }
}

/// Diagnostics configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub level: String,

    /// Emit diagnostics as JSON.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
