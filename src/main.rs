/// Stateway: finite-state workflow engine
///
/// Main entry point for the Stateway server. Loads configuration and starts the
/// HTTP server exposing definition and instance management.

use stateway::{
    config::Config,
    server::{init_tracing, start_server},
};

/// Application entry point
///
/// The server provides:
/// - Workflow definition API at /api/workflows/*
/// - Instance and action API at /api/instances/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up STATEWAY_* overrides from a local .env, if any
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::default();

    start_server(config).await
}
