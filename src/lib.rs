//! Request logging for axum/tower HTTP services.
//!
//! Wraps a handler, observes each request/response cycle, builds a log
//! record through the active sink and hands it back to the sink on a detached
//! task once the response has been written.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ RequestLogLayer ──▶ handler
//!                        │  request ID, route name, params
//!                        │  panic → 500
//!                        ▼
//!     Client Response ◀── RecordingBody ◀── response
//!                        │  status + length (ResponseRecorder)
//!                        ▼  end of body
//!                     active Sink::new_record
//!                        → capability setters (duration, ID, name, params, error)
//!                        → send checkers (skipped on panic)
//!                        → tokio::spawn(Sink::send)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{Router, routing::get};
//! use httplog::{ConsoleFormat, ConsoleSink, RequestLogLayer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! httplog::register("json", Arc::new(ConsoleSink::new(ConsoleFormat::Json)));
//! httplog::select("json");
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }).layer(RequestLogLayer::new().named("index")));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod record;
pub mod sink;

pub use config::LogConfig;
pub use http::{RequestId, RequestIdExt, RequestLogLayer, RequestLogService, RouteName, RouteParams};
pub use pipeline::Features;
pub use record::{AccessRecord, Record};
pub use sink::{
    ConsoleFormat, ConsoleSink, SampledSink, Sink, SinkError, SinkRegistry, active_sink, register,
    select,
};
