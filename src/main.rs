//! Request logging demo server.
//!
//! Serves a handful of routes wrapped in `RequestLogLayer` so every sink and
//! enrichment can be tried from the command line.
//!
//! ```text
//! httplog-demo --config httplog.toml
//! curl http://localhost:8080/users/42
//! curl -X POST http://localhost:8080/users -d '{"name":"alice"}'
//! curl http://localhost:8080/panic
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use httplog::config::{ConfigWatcher, LogConfig, load_config};
use httplog::observability::init_logging;
use httplog::sink::{SinkRegistry, register_builtin};
use httplog::{RequestId, RequestLogLayer};

#[derive(Parser)]
#[command(name = "httplog-demo")]
#[command(about = "Demo server for the request logging layer", long_about = None)]
struct Cli {
    /// TOML configuration file, watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `sink.active` (console, json, sampled).
    #[arg(short, long)]
    sink: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LogConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(sink) = cli.sink {
        config.sink.active = sink;
    }

    init_logging(&config.logging)?;
    tracing::info!("httplog-demo v0.1.0 starting");

    let registry = SinkRegistry::global();
    register_builtin(&registry, &config.sink);
    registry.apply(&config);

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match &cli.config {
        Some(path) => Some(ConfigWatcher::new(path, Arc::clone(&registry)).run()?),
        None => None,
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let app = build_router(&config, registry);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Build the demo router, one logging layer per route.
#[allow(deprecated)]
fn build_router(config: &LogConfig, registry: Arc<SinkRegistry>) -> Router {
    let logged = RequestLogLayer::from_config(registry, config);

    Router::new()
        .route("/", get(index).layer(logged.clone().named("index")))
        .route("/users", post(create_user).layer(logged.clone().named("users.create")))
        .route("/users/{id}", get(get_user).layer(logged.clone().named("users.get")))
        .route("/panic", get(panics).layer(logged.clone().named("panic")))
        .route("/healthz", get(healthz).layer(logged))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
}

async fn index() -> &'static str {
    "httplog demo\n"
}

async fn get_user(Path(id): Path<String>, request_id: Option<axum::Extension<RequestId>>) -> impl IntoResponse {
    let request_id = request_id.map(|ext| ext.0.to_string()).unwrap_or_default();
    (
        [("content-type", "application/json")],
        format!(r#"{{"id":"{id}","name":"alice","request_id":"{request_id}"}}"#),
    )
}

async fn create_user(body: Bytes) -> impl IntoResponse {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "empty body").into_response();
    }
    (StatusCode::CREATED, [("location", "/users/99")], body).into_response()
}

async fn panics() -> &'static str {
    panic!("demo handler panicked")
}

async fn healthz() -> &'static str {
    "ok"
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
