/// Workflow store: the single source of truth for definitions and instances
///
/// All reads and writes go through one mutex per store, and every mutation
/// rewrites the full snapshot while still holding it. Readers therefore never see
/// a half-applied change, and two mutations never interleave.

use crate::error::{EngineError, EngineResult, PersistenceError};
use crate::workflow::storage::{Snapshot, SnapshotBackend};
use crate::workflow::types::{WorkflowDefinition, WorkflowInstance};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::str::FromStr;
use tokio::sync::Mutex;

/// A change applied to an instance inside the store's critical section
///
/// Receives the instance's effective definition and a working copy of the
/// instance. The copy is committed only if the mutation returns `Ok`.
pub type InstanceMutation =
    Box<dyn FnOnce(&WorkflowDefinition, &mut WorkflowInstance) -> EngineResult<()> + Send>;

/// Which definition an instance is checked against when actions are applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DefinitionBinding {
    /// Whatever definition currently lives under the instance's slug.
    /// Overwriting a definition changes the rules for in-flight instances.
    #[default]
    Live,
    /// A copy of the definition taken when the instance was created
    Pinned,
}

impl FromStr for DefinitionBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "pinned" => Ok(Self::Pinned),
            other => Err(format!("unknown definition binding '{}'", other)),
        }
    }
}

/// Storage capability used by the runner and the HTTP layer
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Upsert a definition by slug. Validation is the caller's job.
    async fn save_definition(&self, definition: WorkflowDefinition) -> EngineResult<()>;

    async fn get_definition(&self, slug: &str) -> Option<WorkflowDefinition>;

    async fn get_all_definitions(&self) -> Vec<WorkflowDefinition>;

    /// Start a new instance of `slug` at its enabled initial state
    async fn create_instance(&self, slug: &str) -> EngineResult<WorkflowInstance>;

    async fn get_instance(&self, instance_id: &str) -> Option<WorkflowInstance>;

    /// The instance together with the definition it is checked against, read
    /// under a single lock. `None` if either is missing.
    async fn get_instance_with_definition(
        &self,
        instance_id: &str,
    ) -> Option<(WorkflowInstance, WorkflowDefinition)>;

    /// Upsert an instance by id
    async fn save_instance(&self, instance: WorkflowInstance) -> EngineResult<()>;

    /// Atomically read, change and persist one instance.
    /// `Ok(None)` when the instance or its definition is missing.
    async fn update_instance(
        &self,
        instance_id: &str,
        mutation: InstanceMutation,
    ) -> EngineResult<Option<WorkflowInstance>>;

    async fn get_all_instances(&self) -> Vec<WorkflowInstance>;

    async fn get_instances_by_slug(&self, slug: &str) -> Vec<WorkflowInstance>;

    /// Write the full contents to the snapshot backend
    async fn save_snapshot(&self) -> EngineResult<()>;

    /// Replace the full contents with the backend's snapshot; missing file is a no-op
    async fn load_snapshot(&self) -> EngineResult<()>;
}

#[derive(Debug, Default)]
struct Collections {
    definitions: IndexMap<String, WorkflowDefinition>,
    instances: IndexMap<String, WorkflowInstance>,
}

impl Collections {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            workflows: self.definitions.values().cloned().collect(),
            instances: self.instances.values().cloned().collect(),
        }
    }

    fn effective_definition<'a>(
        &'a self,
        instance: &'a WorkflowInstance,
    ) -> Option<&'a WorkflowDefinition> {
        instance
            .pinned_definition
            .as_ref()
            .or_else(|| self.definitions.get(&instance.definition_slug))
    }
}

/// In-memory store with optional write-through snapshot persistence
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    inner: Mutex<Collections>,
    /// `None` keeps everything in memory only
    backend: Option<Box<dyn SnapshotBackend>>,
    binding: DefinitionBinding,
}

impl InMemoryWorkflowStore {
    /// Memory-only store with live definition binding
    pub fn new() -> Self {
        Self::default()
    }

    /// Store persisting every mutation through `backend`
    pub fn with_backend(backend: impl SnapshotBackend + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
            ..Self::default()
        }
    }

    pub fn with_binding(mut self, binding: DefinitionBinding) -> Self {
        self.binding = binding;
        self
    }

    /// Write-through hook called with the lock held
    fn persist(&self, collections: &Collections) -> Result<(), PersistenceError> {
        match &self.backend {
            Some(backend) => backend.write(&collections.snapshot()).map_err(|e| {
                tracing::error!("Failed to persist workflow snapshot: {}", e);
                e
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn save_definition(&self, definition: WorkflowDefinition) -> EngineResult<()> {
        let mut guard = self.inner.lock().await;
        let slug = definition.slug.clone();
        let previous = guard.definitions.insert(slug.clone(), definition);

        if let Err(e) = self.persist(&guard) {
            match previous {
                Some(prev) => {
                    guard.definitions.insert(slug, prev);
                }
                None => {
                    guard.definitions.shift_remove(&slug);
                }
            }
            return Err(e.into());
        }

        tracing::info!("Saved workflow definition: {}", slug);
        Ok(())
    }

    async fn get_definition(&self, slug: &str) -> Option<WorkflowDefinition> {
        self.inner.lock().await.definitions.get(slug).cloned()
    }

    async fn get_all_definitions(&self) -> Vec<WorkflowDefinition> {
        self.inner.lock().await.definitions.values().cloned().collect()
    }

    async fn create_instance(&self, slug: &str) -> EngineResult<WorkflowInstance> {
        let mut guard = self.inner.lock().await;

        let definition = guard
            .definitions
            .get(slug)
            .ok_or_else(|| EngineError::DefinitionNotFound(slug.to_string()))?;
        let initial = definition.initial_state().ok_or_else(|| {
            EngineError::InvalidState("No enabled initial state found.".to_string())
        })?;

        let mut instance = WorkflowInstance::start(slug, initial.id.clone());
        if self.binding == DefinitionBinding::Pinned {
            instance.pinned_definition = Some(definition.clone());
        }

        let id = instance.instance_id.clone();
        guard.instances.insert(id.clone(), instance.clone());
        if let Err(e) = self.persist(&guard) {
            guard.instances.shift_remove(&id);
            return Err(e.into());
        }

        tracing::info!(
            "Started instance {} of '{}' at state '{}'",
            id,
            slug,
            instance.current_state
        );
        Ok(instance)
    }

    async fn get_instance(&self, instance_id: &str) -> Option<WorkflowInstance> {
        self.inner.lock().await.instances.get(instance_id).cloned()
    }

    async fn get_instance_with_definition(
        &self,
        instance_id: &str,
    ) -> Option<(WorkflowInstance, WorkflowDefinition)> {
        let guard = self.inner.lock().await;
        let instance = guard.instances.get(instance_id)?;
        let definition = guard.effective_definition(instance)?;
        Some((instance.clone(), definition.clone()))
    }

    async fn save_instance(&self, instance: WorkflowInstance) -> EngineResult<()> {
        let mut guard = self.inner.lock().await;
        let id = instance.instance_id.clone();
        let previous = guard.instances.insert(id.clone(), instance);

        if let Err(e) = self.persist(&guard) {
            match previous {
                Some(prev) => {
                    guard.instances.insert(id, prev);
                }
                None => {
                    guard.instances.shift_remove(&id);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn update_instance(
        &self,
        instance_id: &str,
        mutation: InstanceMutation,
    ) -> EngineResult<Option<WorkflowInstance>> {
        let mut guard = self.inner.lock().await;

        let Some(current) = guard.instances.get(instance_id) else {
            return Ok(None);
        };
        let Some(definition) = guard.effective_definition(current) else {
            return Ok(None);
        };

        let mut working = current.clone();
        mutation(definition, &mut working)?;

        let previous = guard.instances.insert(instance_id.to_string(), working.clone());
        if let Err(e) = self.persist(&guard) {
            if let Some(prev) = previous {
                guard.instances.insert(instance_id.to_string(), prev);
            }
            return Err(e.into());
        }

        Ok(Some(working))
    }

    async fn get_all_instances(&self) -> Vec<WorkflowInstance> {
        self.inner.lock().await.instances.values().cloned().collect()
    }

    async fn get_instances_by_slug(&self, slug: &str) -> Vec<WorkflowInstance> {
        self.inner
            .lock()
            .await
            .instances
            .values()
            .filter(|i| i.definition_slug == slug)
            .cloned()
            .collect()
    }

    async fn save_snapshot(&self) -> EngineResult<()> {
        let guard = self.inner.lock().await;
        self.persist(&guard)?;
        Ok(())
    }

    async fn load_snapshot(&self) -> EngineResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };

        let mut guard = self.inner.lock().await;
        let Some(snapshot) = backend.read()? else {
            tracing::info!("No workflow snapshot found, starting empty");
            return Ok(());
        };

        guard.definitions = snapshot
            .workflows
            .into_iter()
            .map(|d| (d.slug.clone(), d))
            .collect();
        guard.instances = snapshot
            .instances
            .into_iter()
            .map(|i| (i.instance_id.clone(), i))
            .collect();

        tracing::info!(
            "Loaded workflow snapshot with {} definitions and {} instances",
            guard.definitions.len(),
            guard.instances.len()
        );
        Ok(())
    }
}
