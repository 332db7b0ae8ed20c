/// Workflow Management Layer
///
/// This module handles workflow definitions, instances and their storage.
/// It provides:
/// - Type definitions (WorkflowDefinition, State, Action, WorkflowInstance)
/// - Structural validation of definitions
/// - Single-file JSON snapshot persistence
/// - The mutex-guarded store that owns every definition and instance

// Core workflow type definitions
pub mod types;

// Save-time structural checks
pub mod validator;

// Snapshot persistence backends
pub mod storage;

// Authoritative in-memory store
pub mod registry;

// Re-export commonly used types
pub use registry::{DefinitionBinding, InMemoryWorkflowStore, WorkflowStore};
pub use storage::{JsonFileBackend, Snapshot, SnapshotBackend};
pub use types::{Action, ActionHistoryEntry, State, WorkflowDefinition, WorkflowInstance};
pub use validator::{validate, ValidationReport};
