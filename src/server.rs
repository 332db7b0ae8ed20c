/// Server setup and initialization
///
/// Wires together the store, snapshot persistence, runner and HTTP routes.

use crate::{
    api::{create_instance_routes, create_workflow_routes, AppState},
    config::Config,
    workflow::{
        registry::{InMemoryWorkflowStore, WorkflowStore},
        storage::JsonFileBackend,
    },
};
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the store described by `config` and load its snapshot
pub async fn create_store(config: &Config) -> Result<Arc<dyn WorkflowStore>> {
    let store = if config.storage.persist {
        tracing::info!("📁 Using snapshot file: {}", config.storage.data_file.display());
        InMemoryWorkflowStore::with_backend(JsonFileBackend::new(&config.storage.data_file))
    } else {
        tracing::info!("🧠 Snapshot persistence disabled, keeping state in memory");
        InMemoryWorkflowStore::new()
    };
    let store = store.with_binding(config.definition_binding);

    tracing::info!("📥 Loading workflows from snapshot");
    store
        .load_snapshot()
        .await
        .context("Failed to load workflow snapshot")?;

    Ok(Arc::new(store))
}

/// Assemble the router for an already-wired application state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/test", get(test_route))
        .merge(create_workflow_routes())
        .merge(create_instance_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Create the main Axum application with all routes and middleware
pub async fn create_app(config: Config) -> Result<Router> {
    let store = create_store(&config).await?;

    tracing::info!(
        "⚙️ Initializing workflow runner ({:?} definition binding)",
        config.definition_binding
    );
    let app = build_router(AppState::new(store));

    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Initialize the tracing subscriber (RUST_LOG, default `info`)
///
/// Call before building `Config` so configuration warnings are not dropped.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing::info!("Starting Stateway server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

/// Liveness probe kept for existing API clients
async fn test_route() -> Json<Value> {
    Json(json!({ "message": "Test route is working!" }))
}
