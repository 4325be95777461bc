//! Request logging tower layer.
//!
//! # Responsibilities
//! - Assign the request ID and route name context slots
//! - Optionally capture matched path parameters as route params
//! - Run the inner service, turning a panic into a 500 response
//! - Hand the response to a [`RecordingBody`] that finishes the request
//!
//! # Usage
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use httplog::RequestLogLayer;
//!
//! let logged = RequestLogLayer::new();
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/users/{id}",
//!         get(|| async { "user" }).layer(logged.clone().named("users.get").capture_path_params(true)),
//!     )
//!     .route("/healthz", get(|| async { "ok" }).layer(logged));
//! ```
//!
//! Apply the layer once per request path: stacking it on a route and on the
//! whole router logs that route twice.

use std::any::Any;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use serde_json::{Map, Value};
use tower::{Layer, Service};

use crate::config::LogConfig;
use crate::http::body::RecordingBody;
use crate::http::request::{RequestHead, RequestId, RouteName, RouteParams, X_REQUEST_ID};
use crate::pipeline::dispatch::Completion;
use crate::pipeline::Features;
use crate::sink::SinkRegistry;

/// Body sent to clients when the handler panicked.
pub const INTERNAL_ERROR_BODY: &str = "There was an internal server error";

#[derive(Debug, Clone)]
struct LayerOptions {
    route_name: Option<String>,
    header: HeaderName,
    trust_incoming_header: bool,
    expose_header: bool,
    capture_path_params: bool,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            route_name: None,
            header: HeaderName::from_static(X_REQUEST_ID),
            trust_incoming_header: false,
            expose_header: false,
            capture_path_params: false,
        }
    }
}

/// Layer that logs every request passing through it.
#[derive(Clone)]
pub struct RequestLogLayer {
    registry: Arc<SinkRegistry>,
    options: Arc<LayerOptions>,
}

impl RequestLogLayer {
    /// Log through the process-wide registry.
    pub fn new() -> Self {
        Self::with_registry(SinkRegistry::global())
    }

    /// Log through `registry`.
    pub fn with_registry(registry: Arc<SinkRegistry>) -> Self {
        Self {
            registry,
            options: Arc::new(LayerOptions::default()),
        }
    }

    /// Log through `registry` with the request-ID and capture settings of
    /// `config`.
    pub fn from_config(registry: Arc<SinkRegistry>, config: &LogConfig) -> Self {
        let header = HeaderName::try_from(config.request_id.header.as_str()).unwrap_or_else(|_| {
            tracing::warn!(
                header = %config.request_id.header,
                "Invalid request ID header name, using {}", X_REQUEST_ID
            );
            HeaderName::from_static(X_REQUEST_ID)
        });

        Self::with_registry(registry)
            .request_id_header(header)
            .trust_incoming_header(config.request_id.trust_incoming_header)
            .expose_header(config.request_id.expose_header)
            .capture_path_params(config.features.capture_path_params)
    }

    /// Set the route name for requests that do not carry one yet.
    pub fn named(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.configure(|o| o.route_name = Some(name))
    }

    /// Header used to propagate and expose the request ID.
    pub fn request_id_header(self, header: HeaderName) -> Self {
        self.configure(|o| o.header = header)
    }

    /// Reuse a valid incoming request ID instead of generating one.
    pub fn trust_incoming_header(self, trust: bool) -> Self {
        self.configure(|o| o.trust_incoming_header = trust)
    }

    /// Echo the request ID on the response.
    pub fn expose_header(self, expose: bool) -> Self {
        self.configure(|o| o.expose_header = expose)
    }

    /// Fill route params from the router's matched path parameters.
    ///
    /// Only works where path parameters are known, i.e. when the layer is
    /// applied to a route rather than to the whole router.
    pub fn capture_path_params(self, capture: bool) -> Self {
        self.configure(|o| o.capture_path_params = capture)
    }

    pub fn registry(&self) -> &Arc<SinkRegistry> {
        &self.registry
    }

    fn configure(mut self, f: impl FnOnce(&mut LayerOptions)) -> Self {
        f(Arc::make_mut(&mut self.options));
        self
    }
}

impl Default for RequestLogLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService {
            inner,
            registry: Arc::clone(&self.registry),
            options: Arc::clone(&self.options),
        }
    }
}

/// Service produced by [`RequestLogLayer`].
#[derive(Clone)]
pub struct RequestLogService<S> {
    inner: S,
    registry: Arc<SinkRegistry>,
    options: Arc<LayerOptions>,
}

impl<S> Service<Request<Body>> for RequestLogService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Take the service that was driven to readiness, leave a clone behind.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let registry = Arc::clone(&self.registry);
        let options = Arc::clone(&self.options);

        Box::pin(intercept(inner, req, registry, options))
    }
}

async fn intercept<S>(
    mut inner: S,
    mut req: Request<Body>,
    registry: Arc<SinkRegistry>,
    options: Arc<LayerOptions>,
) -> Result<Response, Infallible>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Send + 'static,
    S::Future: Send + 'static,
{
    // 1. Start
    let started = Instant::now();
    let features = registry.features();

    // 2. Context slots
    let request_id = assign_request_id(&mut req, features, &options);
    if let Some(name) = &options.route_name {
        if req.extensions().get::<RouteName>().is_none() {
            req.extensions_mut().insert(RouteName::new(name.as_str()));
        }
    }
    if options.capture_path_params && features.contains(Features::PARAMS) {
        req = capture_path_params(req).await;
    }
    let head = RequestHead::capture(&req);

    // 3. Handler
    let outcome = AssertUnwindSafe(async move { inner.call(req).await })
        .catch_unwind()
        .await;

    let (mut response, panic) = match outcome {
        Ok(Ok(response)) => (response, None),
        Ok(Err(never)) => match never {},
        // 4. Panicked
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(
                request_id = request_id.as_ref().map(RequestId::as_str).unwrap_or_default(),
                method = %head.method,
                path = %head.path(),
                panic = %message,
                "Handler panicked"
            );
            let response = (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response();
            (response, Some(message))
        }
    };

    if options.expose_header {
        if let Some(value) = request_id.as_ref().and_then(|id| HeaderValue::from_str(id.as_str()).ok()) {
            response.headers_mut().insert(options.header.clone(), value);
        }
    }

    // 5-7. Record, decide and dispatch once the body is written.
    let completion = Completion {
        head,
        started,
        features,
        registry,
        panic,
    };
    Ok(RecordingBody::wrap(response, completion))
}

fn assign_request_id(
    req: &mut Request<Body>,
    features: Features,
    options: &LayerOptions,
) -> Option<RequestId> {
    if !features.contains(Features::REQUEST_ID) {
        return None;
    }
    // Written once: an outer logging layer may already have assigned it.
    if let Some(existing) = req.extensions().get::<RequestId>() {
        return Some(existing.clone());
    }

    let incoming = if options.trust_incoming_header {
        req.headers()
            .get(&options.header)
            .and_then(|v| v.to_str().ok())
            .and_then(RequestId::from_header)
    } else {
        None
    };
    let id = incoming.unwrap_or_else(RequestId::generate);
    req.extensions_mut().insert(id.clone());
    Some(id)
}

async fn capture_path_params(req: Request<Body>) -> Request<Body> {
    if req.extensions().get::<RouteParams>().is_some() {
        return req;
    }

    let (mut parts, body) = req.into_parts();
    if let Ok(raw) = RawPathParams::from_request_parts(&mut parts, &()).await {
        let params: Map<String, Value> = raw
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        if !params.is_empty() {
            parts.extensions.insert(RouteParams(Value::Object(params)));
        }
    }
    Request::from_parts(parts, body)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
