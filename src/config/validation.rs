//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (sample rate, status floor)
//! - Validate names that are parsed later (header, bind address, filter)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::LogConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sink.active must not be empty")]
    EmptySinkName,

    #[error("sink.sample_rate must be within 0.0..=1.0, got {0}")]
    SampleRateOutOfRange(f64),

    #[error("sink.min_status must be a valid HTTP status, got {0}")]
    MinStatusOutOfRange(u16),

    #[error("request_id.header is not a valid header name: {0:?}")]
    InvalidHeaderName(String),

    #[error("server.bind_address is not a socket address: {0:?}")]
    InvalidBindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("logging.level is not a valid filter: {0:?}")]
    InvalidLogLevel(String),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &LogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sink.active.trim().is_empty() {
        errors.push(ValidationError::EmptySinkName);
    }

    if !(0.0..=1.0).contains(&config.sink.sample_rate) {
        errors.push(ValidationError::SampleRateOutOfRange(config.sink.sample_rate));
    }

    if let Some(status) = config.sink.min_status {
        if !(100..=599).contains(&status) {
            errors.push(ValidationError::MinStatusOutOfRange(status));
        }
    }

    if HeaderName::try_from(config.request_id.header.as_str()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(config.request_id.header.clone()));
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.server.bind_address.clone()));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
