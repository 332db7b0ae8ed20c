/// HTTP API Layer
///
/// Thin REST boundary over the store and runner. It handles:
/// - Definition listing, validation and upsert
/// - Instance creation, lookup and action application
/// - Mapping engine errors onto HTTP responses

use crate::error::EngineError;
use crate::runtime::engine::{StoreWorkflowRunner, WorkflowRunner};
use crate::workflow::registry::WorkflowStore;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;

// Definition endpoints and instance creation under /api/workflows
pub mod workflows;

// Instance inspection and action endpoints under /api/instances
pub mod instances;

// Re-export router builders
pub use instances::create_instance_routes;
pub use workflows::create_workflow_routes;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Authoritative definition and instance store
    pub store: Arc<dyn WorkflowStore>,
    /// Action runner bound to the same store
    pub runner: Arc<dyn WorkflowRunner>,
}

impl AppState {
    /// Wire a store-backed runner onto `store`
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        let runner = Arc::new(StoreWorkflowRunner::new(Arc::clone(&store)));
        Self { store, runner }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        match self {
            EngineError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            EngineError::DefinitionNotFound(_)
            | EngineError::InvalidState(_)
            | EngineError::InvalidTransition(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            EngineError::Persistence(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
        }
    }
}
