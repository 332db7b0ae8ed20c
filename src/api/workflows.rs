/// Workflow definition REST API endpoints
///
/// Definitions are validated before they reach the store; a rejected definition
/// is never partially applied. Instances are started from here as well since
/// they hang off a definition's slug.

use crate::{
    api::AppState,
    error::EngineError,
    workflow::{
        types::{WorkflowDefinition, WorkflowInstance},
        validator::ValidationReport,
    },
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};

/// Create workflow definition routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", get(list_workflows).post(save_workflow))
        .route("/api/workflows/{slug}", get(get_workflow))
        .route(
            "/api/workflows/{slug}/instances",
            get(list_workflow_instances).post(start_instance),
        )
}

/// List all workflow definitions
///
/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Json<Vec<WorkflowDefinition>> {
    Json(state.store.get_all_definitions().await)
}

/// Create or replace a workflow definition
///
/// POST /api/workflows
/// Body: { "slug": "...", "states": [...], "actions": [...] }
/// Returns 400 { "errors": [...] } when the definition is structurally invalid.
async fn save_workflow(
    State(state): State<AppState>,
    Json(definition): Json<WorkflowDefinition>,
) -> Result<Json<WorkflowDefinition>, EngineError> {
    let report = ValidationReport::of(&definition);
    if !report.is_valid() {
        tracing::warn!(
            "Rejected workflow '{}': {:?}",
            definition.slug,
            report.errors()
        );
    }
    report.into_result()?;

    state.store.save_definition(definition.clone()).await?;
    Ok(Json(definition))
}

/// Get a workflow definition by slug
///
/// GET /api/workflows/{slug}
async fn get_workflow(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<WorkflowDefinition>, StatusCode> {
    state
        .store
        .get_definition(&slug)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// List instances of one workflow
///
/// GET /api/workflows/{slug}/instances
async fn list_workflow_instances(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<Vec<WorkflowInstance>> {
    Json(state.store.get_instances_by_slug(&slug).await)
}

/// Start a new instance at the definition's initial state
///
/// POST /api/workflows/{slug}/instances
/// Returns 201 with a Location header pointing at the new instance.
async fn start_instance(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, EngineError> {
    let instance = state.store.create_instance(&slug).await?;
    let location = format!("/api/instances/{}", instance.instance_id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(instance),
    )
        .into_response())
}
