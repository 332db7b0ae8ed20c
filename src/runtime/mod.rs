/// Runtime layer
///
/// Applies actions to workflow instances. It handles:
/// - The ordered transition rules (pure functions)
/// - The store-backed runner that commits transitions atomically

// Pure transition and availability rules
pub mod transition;

// Store-backed action runner
pub mod engine;

// Re-export main types
pub use engine::{StoreWorkflowRunner, WorkflowRunner};
