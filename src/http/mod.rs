//! HTTP interception subsystem.
//!
//! # Data Flow
//! ```text
//! host server (axum)
//!     → layer.rs (request ID, route name, params, panic recovery)
//!     → inner handler
//!     → body.rs (response body streamed through the recorder)
//!     → recorder.rs (status and length observed)
//!     → pipeline (record built and dispatched at end of body)
//! ```

pub mod body;
pub mod layer;
pub mod recorder;
pub mod request;

pub use body::RecordingBody;
pub use layer::{INTERNAL_ERROR_BODY, RequestLogLayer, RequestLogService};
pub use recorder::{Recorded, ResponseRecorder, ResponseWriter};
pub use request::{LogContext, RequestHead, RequestId, RequestIdExt, RouteName, RouteParams, X_REQUEST_ID};
