/// Stateway: finite-state workflow engine
///
/// This library manages reusable workflow definitions (named state machines) and
/// tracks the instances running against them as named actions move them between
/// states.

// Core configuration and setup
pub mod config;

// Typed engine errors
pub mod error;

// Workflow management layer - definitions, validation, store and snapshot persistence
pub mod workflow;

// Runtime layer - ordered transition rules and the store-backed runner
pub mod runtime;

// HTTP API layer - REST endpoints for definitions and instances
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use error::{EngineError, TransitionError};
pub use runtime::{StoreWorkflowRunner, WorkflowRunner};
pub use server::start_server;
pub use workflow::{InMemoryWorkflowStore, WorkflowDefinition, WorkflowInstance, WorkflowStore};
