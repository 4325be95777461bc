//! End-to-end tests of the logging layer through an axum router.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};
use futures_util::stream;
use httplog::sink::{SampledSink, SinkRegistry};
use httplog::{Features, RequestIdExt, RequestLogLayer, RouteName, RouteParams};
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{CaptureSink, GatedSink, assert_no_record, next_record, registry_with};

async fn call(app: Router, req: Request) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

fn get_request(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn hello_app(registry: Arc<SinkRegistry>) -> Router {
    let logged = RequestLogLayer::with_registry(registry);
    Router::new().route(
        "/hello",
        get(|| async { "hello world" }).layer(logged.named("hello")),
    )
}

#[tokio::test]
async fn test_records_status_length_and_name() {
    let (sink, mut rx) = CaptureSink::new();
    let app = hello_app(registry_with(sink));

    let req = Request::builder()
        .uri("/hello?lang=en")
        .header("user-agent", "pipeline-test")
        .header("x-real-ip", "10.1.2.3")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = call(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"hello world");

    let record = next_record(&mut rx).await;
    assert_eq!(record["status"], 200);
    assert_eq!(record["content_length"], 11);
    assert_eq!(record["method"], "GET");
    assert_eq!(record["path"], "/hello");
    assert_eq!(record["query_string"], "lang=en");
    assert_eq!(record["user_agent"], "pipeline-test");
    assert_eq!(record["remote_ip"], "10.1.2.3");
    assert_eq!(record["route_name"], "hello");
    assert!(record["duration"].is_u64());
    assert!(record["time"].is_string());
    assert!(!record["request_id"].as_str().unwrap().is_empty());
    assert!(record.get("error").is_none());
    assert!(record.get("params").is_none());

    assert_no_record(&mut rx).await;
}

#[tokio::test]
async fn test_request_ids_are_unique() {
    let (sink, mut rx) = CaptureSink::new();
    let app = hello_app(registry_with(sink));

    call(app.clone(), get_request("/hello")).await;
    call(app, get_request("/hello")).await;

    let first = next_record(&mut rx).await;
    let second = next_record(&mut rx).await;
    assert_ne!(first["request_id"], second["request_id"]);
}

#[tokio::test]
async fn test_disabled_features_leave_fields_unset() {
    let (sink, mut rx) = CaptureSink::new();
    let registry = registry_with(sink);
    let mut features = Features::ALL;
    features.remove(Features::REQUEST_ID);
    features.remove(Features::NAME);
    registry.set_features(features);

    call(hello_app(registry), get_request("/hello")).await;

    let record = next_record(&mut rx).await;
    assert!(record.get("request_id").is_none());
    assert!(record.get("route_name").is_none());
    assert_eq!(record["status"], 200);
}

#[tokio::test]
async fn test_handler_sees_the_logged_request_id() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink));
    let app = Router::new().route(
        "/whoami",
        get(|req: Request| async move {
            req.request_id().map(ToString::to_string).unwrap_or_default()
        })
        .layer(logged),
    );

    let (_, _, body) = call(app, get_request("/whoami")).await;
    let record = next_record(&mut rx).await;
    assert_eq!(record["request_id"], String::from_utf8_lossy(&body).as_ref());
}

#[tokio::test]
async fn test_record_checker_suppresses_dispatch() {
    let (sink, mut rx) = GatedSink::new(false);
    let app = hello_app(registry_with(sink));

    let (status, _, body) = call(app, get_request("/hello")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"hello world");
    assert_no_record(&mut rx).await;
}

#[tokio::test]
async fn test_record_checker_allows_dispatch() {
    let (sink, mut rx) = GatedSink::new(true);
    call(hello_app(registry_with(sink)), get_request("/hello")).await;
    assert_eq!(next_record(&mut rx).await["status"], 200);
}

#[tokio::test]
async fn test_sink_checker_filters_on_status() {
    let (capture, mut rx) = CaptureSink::new();
    let sampled = Arc::new(SampledSink::new(capture, 0.0).with_min_status(Some(500)));
    let logged = RequestLogLayer::with_registry(registry_with(sampled));
    let app = Router::new()
        .route("/ok", get(|| async { "fine" }).layer(logged.clone()))
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }).layer(logged),
        );

    call(app.clone(), get_request("/ok")).await;
    assert_no_record(&mut rx).await;

    call(app, get_request("/down")).await;
    assert_eq!(next_record(&mut rx).await["status"], 503);
}

#[tokio::test]
async fn test_streamed_body_length_is_summed() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink));
    let app = Router::new().route(
        "/stream",
        get(|| async {
            let chunks = [10, 20, 5]
                .into_iter()
                .map(|n| Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; n])));
            Body::from_stream(stream::iter(chunks))
        })
        .layer(logged),
    );

    let (_, _, body) = call(app, get_request("/stream")).await;
    assert_eq!(body.len(), 35);

    let record = next_record(&mut rx).await;
    assert_eq!(record["content_length"], 35);
    assert_eq!(record["status"], 200);
}

#[tokio::test]
async fn test_status_without_body() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink));
    let app = Router::new().route(
        "/gone",
        get(|| async { StatusCode::NOT_FOUND }).layer(logged),
    );

    call(app, get_request("/gone")).await;

    let record = next_record(&mut rx).await;
    assert_eq!(record["status"], 404);
    assert_eq!(record["content_length"], 0);
}

#[tokio::test]
async fn test_path_params_captured() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink));
    let app = Router::new()
        .route(
            "/users/{id}",
            get(|| async { "user" }).layer(logged.clone().named("users.get").capture_path_params(true)),
        )
        .route("/teams/{id}", get(|| async { "team" }).layer(logged));

    call(app.clone(), get_request("/users/42")).await;
    let record = next_record(&mut rx).await;
    assert_eq!(record["params"], json!({ "id": "42" }));
    assert_eq!(record["route_name"], "users.get");

    call(app, get_request("/teams/7")).await;
    let record = next_record(&mut rx).await;
    assert!(record.get("params").is_none());
}

#[tokio::test]
async fn test_upstream_context_is_kept() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink));
    let app = Router::new().route(
        "/orders",
        get(|| async { "orders" })
            .layer::<_, Infallible>(logged.named("inner").capture_path_params(true))
            .layer::<_, Infallible>(Extension(RouteName::new("outer")))
            .layer::<_, Infallible>(Extension(RouteParams(json!({ "tenant": "acme", "page": 2 })))),
    );

    call(app, get_request("/orders")).await;

    let record = next_record(&mut rx).await;
    assert_eq!(record["route_name"], "outer");
    assert_eq!(record["params"], json!({ "tenant": "acme", "page": 2 }));
}

#[tokio::test]
async fn test_trusted_incoming_id_is_exposed() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink))
        .trust_incoming_header(true)
        .expose_header(true);
    let app = Router::new().route("/hello", get(|| async { "hi" }).layer(logged));

    let req = Request::builder()
        .uri("/hello")
        .header("x-request-id", "edge-abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = call(app, req).await;
    assert_eq!(headers["x-request-id"], "edge-abc-123");

    let record = next_record(&mut rx).await;
    assert_eq!(record["request_id"], "edge-abc-123");
}

#[tokio::test]
async fn test_untrusted_incoming_id_is_replaced() {
    let (sink, mut rx) = CaptureSink::new();
    let logged = RequestLogLayer::with_registry(registry_with(sink)).expose_header(true);
    let app = Router::new().route("/hello", get(|| async { "hi" }).layer(logged));

    let req = Request::builder()
        .uri("/hello")
        .header("x-request-id", "edge-abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = call(app, req).await;
    let exposed = headers["x-request-id"].to_str().unwrap().to_string();
    assert_ne!(exposed, "edge-abc-123");

    let record = next_record(&mut rx).await;
    assert_eq!(record["request_id"], exposed);
}

#[tokio::test]
async fn test_sink_swap_applies_to_later_requests() {
    let (first, mut first_rx) = CaptureSink::new();
    let (second, mut second_rx) = CaptureSink::new();
    let registry = registry_with(first);
    registry.register("second", second);
    let app = hello_app(Arc::clone(&registry));

    call(app.clone(), get_request("/hello")).await;
    next_record(&mut first_rx).await;

    assert!(registry.select("second"));
    call(app, get_request("/hello")).await;
    next_record(&mut second_rx).await;
    assert_no_record(&mut first_rx).await;
}
