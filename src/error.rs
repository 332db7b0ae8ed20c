/// Typed errors for the workflow engine
///
/// Every failure the core can report lives here. The HTTP layer maps these onto
/// status codes; nothing in the core retries or treats them as fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level engine error
#[derive(Debug, Error)]
pub enum EngineError {
    /// No definition is stored under the referenced slug
    #[error("Workflow definition '{0}' not found.")]
    DefinitionNotFound(String),

    /// Structural problems in a submitted definition
    #[error("Workflow definition is invalid: {}", .0.join(" "))]
    Validation(Vec<String>),

    /// Definition cannot seed an instance
    #[error("{0}")]
    InvalidState(String),

    /// Action rejected by the transition rules
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Snapshot file could not be read or written
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Reasons an action cannot be applied to an instance
///
/// Checked in declaration order; the first failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Action '{action}' not found or not enabled.")]
    ActionUnavailable { action: String },

    #[error("Action '{action}' not valid from state '{state}'.")]
    NotValidFromState { action: String, state: String },

    #[error("Target state '{state}' not found or not enabled.")]
    TargetUnavailable { state: String },
}

/// Snapshot persistence failures
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to access snapshot file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot file '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
