/// Workflow instance REST API endpoints

use crate::{api::AppState, error::EngineError, workflow::types::WorkflowInstance};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

/// Request body for performing an action
#[derive(Debug, Deserialize)]
pub struct PerformActionRequest {
    pub action: String,
}

/// Create instance routes
pub fn create_instance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/instances", get(list_instances))
        .route("/api/instances/{id}", get(get_instance))
        .route("/api/instances/{id}/actions", post(perform_action))
        .route("/api/instances/{id}/actions/available", get(available_actions))
}

/// List every instance across all workflows
///
/// GET /api/instances
async fn list_instances(State(state): State<AppState>) -> Json<Vec<WorkflowInstance>> {
    Json(state.store.get_all_instances().await)
}

/// Get an instance's current state and history
///
/// GET /api/instances/{id}
async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowInstance>, StatusCode> {
    state
        .store
        .get_instance(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Perform an action on an instance
///
/// POST /api/instances/{id}/actions
/// Body: { "action": "approve" }
/// Returns the updated instance, 404 when the instance or its definition is gone,
/// or 400 { "error": "..." } when the transition rules reject the action.
async fn perform_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PerformActionRequest>,
) -> Result<Response, EngineError> {
    match state.runner.perform_action(&id, &request.action).await? {
        Some(instance) => Ok(Json(instance).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// List the actions that can fire from the instance's current state
///
/// GET /api/instances/{id}/actions/available
/// Always 200; unknown instances yield an empty list.
async fn available_actions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<String>> {
    Json(state.runner.available_actions(&id).await)
}
