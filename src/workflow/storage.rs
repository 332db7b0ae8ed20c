/// Snapshot persistence for the workflow store
///
/// The whole store (all definitions + all instances) is written as one JSON
/// document on every mutation and read back in full at startup. The backend sits
/// behind a trait so the write-through full rewrite can later be replaced with
/// incremental persistence without touching the store's callers.

use crate::error::PersistenceError;
use crate::workflow::types::{WorkflowDefinition, WorkflowInstance};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Full serialized contents of a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// All definitions, in insertion order
    #[serde(default)]
    pub workflows: Vec<WorkflowDefinition>,
    /// All instances, in creation order
    #[serde(default)]
    pub instances: Vec<WorkflowInstance>,
}

/// Durable home for store snapshots
///
/// Implementations are called from inside the store's critical section, so they
/// never see concurrent calls from the same store.
pub trait SnapshotBackend: Send + Sync + std::fmt::Debug {
    /// Read the last written snapshot; `None` when nothing was ever written
    fn read(&self) -> Result<Option<Snapshot>, PersistenceError>;

    /// Replace the stored snapshot with `snapshot`
    fn write(&self, snapshot: &Snapshot) -> Result<(), PersistenceError>;
}

/// Single-file JSON snapshot backend
///
/// Writes go to a sibling temp file that is renamed over the target, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotBackend for JsonFileBackend {
    fn read(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };

        let snapshot = serde_json::from_str(&raw)
            .map_err(|e| PersistenceError::json(&self.path, e))?;
        Ok(Some(snapshot))
    }

    fn write(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| PersistenceError::json(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| PersistenceError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;

        tracing::debug!(
            "Wrote snapshot to {} ({} workflows, {} instances)",
            self.path.display(),
            snapshot.workflows.len(),
            snapshot.instances.len()
        );
        Ok(())
    }
}
