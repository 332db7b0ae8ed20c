/// Workflow runner
///
/// Applies named actions to instances. The runner holds no workflow state of its
/// own: every call borrows the instance and its definition from the store for the
/// duration of one operation, and the whole read-check-write cycle runs inside the
/// store's critical section.

use crate::error::{EngineError, EngineResult};
use crate::runtime::transition;
use crate::workflow::registry::WorkflowStore;
use crate::workflow::types::WorkflowInstance;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Action-application capability used by the HTTP layer
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Fire `action_id` on the instance.
    /// `Ok(None)` when the instance or its definition does not exist.
    async fn perform_action(
        &self,
        instance_id: &str,
        action_id: &str,
    ) -> EngineResult<Option<WorkflowInstance>>;

    /// Ids of actions that could fire right now; empty when nothing is found
    async fn available_actions(&self, instance_id: &str) -> Vec<String>;
}

/// Runner backed by a [`WorkflowStore`]
#[derive(Clone)]
pub struct StoreWorkflowRunner {
    store: Arc<dyn WorkflowStore>,
}

impl StoreWorkflowRunner {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for StoreWorkflowRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreWorkflowRunner").finish_non_exhaustive()
    }
}

#[async_trait]
impl WorkflowRunner for StoreWorkflowRunner {
    async fn perform_action(
        &self,
        instance_id: &str,
        action_id: &str,
    ) -> EngineResult<Option<WorkflowInstance>> {
        let started = std::time::Instant::now();
        let action = action_id.to_string();

        let outcome = self
            .store
            .update_instance(
                instance_id,
                Box::new(move |definition, instance| {
                    transition::apply_action(definition, instance, &action, Utc::now())
                        .map_err(EngineError::from)
                }),
            )
            .await;

        match &outcome {
            Ok(Some(instance)) => tracing::info!(
                "Instance {} performed '{}' -> '{}' in {:?}",
                instance_id,
                action_id,
                instance.current_state,
                started.elapsed()
            ),
            Ok(None) => tracing::debug!("Instance {} or its definition not found", instance_id),
            Err(EngineError::InvalidTransition(e)) => {
                tracing::warn!("Rejected '{}' on instance {}: {}", action_id, instance_id, e)
            }
            Err(e) => tracing::error!("Failed to apply '{}' on {}: {}", action_id, instance_id, e),
        }

        outcome
    }

    async fn available_actions(&self, instance_id: &str) -> Vec<String> {
        match self.store.get_instance_with_definition(instance_id).await {
            Some((instance, definition)) => {
                transition::available_actions(&definition, &instance.current_state)
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransitionError;
    use crate::workflow::registry::{DefinitionBinding, InMemoryWorkflowStore};
    use crate::workflow::types::{Action, State, WorkflowDefinition};

    fn state(id: &str, initial: bool) -> State {
        State { id: id.into(), enabled: true, is_initial: initial, is_final: !initial }
    }

    fn go_definition() -> WorkflowDefinition {
        WorkflowDefinition {
            slug: "ab".into(),
            states: vec![state("A", true), state("B", false)],
            actions: vec![Action {
                id: "go".into(),
                enabled: true,
                from_states: vec!["A".into()],
                to_state: "B".into(),
            }],
        }
    }

    async fn setup(store: InMemoryWorkflowStore) -> (Arc<dyn WorkflowStore>, StoreWorkflowRunner) {
        let store: Arc<dyn WorkflowStore> = Arc::new(store);
        store.save_definition(go_definition()).await.unwrap();
        let runner = StoreWorkflowRunner::new(Arc::clone(&store));
        (store, runner)
    }

    #[tokio::test]
    async fn go_moves_from_a_to_b() {
        let (store, runner) = setup(InMemoryWorkflowStore::new()).await;
        let instance = store.create_instance("ab").await.unwrap();
        let id = instance.instance_id.as_str();

        assert_eq!(runner.available_actions(id).await, vec!["go"]);

        let before = Utc::now();
        let updated = runner.perform_action(id, "go").await.unwrap().unwrap();

        assert_eq!(updated.current_state, "B");
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].action, "go");
        assert!(updated.history[0].timestamp >= before);
        assert_eq!(store.get_instance(id).await, Some(updated));
        assert!(runner.available_actions(id).await.is_empty());
    }

    #[tokio::test]
    async fn repeated_invalid_action_fails_identically() {
        let (store, runner) = setup(InMemoryWorkflowStore::new()).await;
        let instance = store.create_instance("ab").await.unwrap();
        let id = instance.instance_id.as_str();
        runner.perform_action(id, "go").await.unwrap();
        let settled = store.get_instance(id).await;

        for _ in 0..2 {
            let err = runner.perform_action(id, "go").await.unwrap_err();
            assert!(matches!(
                err,
                EngineError::InvalidTransition(TransitionError::NotValidFromState { .. })
            ));
            assert_eq!(err.to_string(), "Action 'go' not valid from state 'B'.");
            assert_eq!(store.get_instance(id).await, settled);
        }
    }

    #[tokio::test]
    async fn missing_instance_or_definition_is_none() {
        let (store, runner) = setup(InMemoryWorkflowStore::new()).await;
        assert!(runner.perform_action("nope", "go").await.unwrap().is_none());
        assert!(runner.available_actions("nope").await.is_empty());

        let orphan = WorkflowInstance::start("deleted", "A");
        let orphan_id = orphan.instance_id.clone();
        store.save_instance(orphan).await.unwrap();
        assert!(runner.perform_action(&orphan_id, "go").await.unwrap().is_none());
        assert!(runner.available_actions(&orphan_id).await.is_empty());
    }

    #[tokio::test]
    async fn live_binding_sees_overwritten_definition() {
        let (store, runner) = setup(InMemoryWorkflowStore::new()).await;
        let instance = store.create_instance("ab").await.unwrap();

        let mut changed = go_definition();
        changed.actions[0].enabled = false;
        store.save_definition(changed).await.unwrap();

        let err = runner.perform_action(&instance.instance_id, "go").await.unwrap_err();
        assert_eq!(err.to_string(), "Action 'go' not found or not enabled.");
    }

    #[tokio::test]
    async fn pinned_binding_ignores_overwritten_definition() {
        let store = InMemoryWorkflowStore::new().with_binding(DefinitionBinding::Pinned);
        let (store, runner) = setup(store).await;
        let instance = store.create_instance("ab").await.unwrap();

        let mut changed = go_definition();
        changed.actions[0].enabled = false;
        store.save_definition(changed).await.unwrap();

        let updated = runner.perform_action(&instance.instance_id, "go").await.unwrap().unwrap();
        assert_eq!(updated.current_state, "B");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_actions_never_lose_updates() {
        let store: Arc<dyn WorkflowStore> = Arc::new(InMemoryWorkflowStore::new());
        store
            .save_definition(WorkflowDefinition {
                slug: "loop".into(),
                states: vec![state("A", true), state("B", false)],
                actions: vec![
                    Action {
                        id: "forth".into(),
                        enabled: true,
                        from_states: vec!["A".into()],
                        to_state: "B".into(),
                    },
                    Action {
                        id: "back".into(),
                        enabled: true,
                        from_states: vec!["B".into()],
                        to_state: "A".into(),
                    },
                ],
            })
            .await
            .unwrap();
        let instance = store.create_instance("loop").await.unwrap();
        let runner = Arc::new(StoreWorkflowRunner::new(Arc::clone(&store)));

        let mut handles = Vec::new();
        for i in 0..40 {
            let runner = Arc::clone(&runner);
            let id = instance.instance_id.clone();
            let action = if i % 2 == 0 { "forth" } else { "back" };
            handles.push(tokio::spawn(async move {
                runner.perform_action(&id, action).await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }

        let final_instance = store.get_instance(&instance.instance_id).await.unwrap();
        assert_eq!(final_instance.history.len(), succeeded);
        let expected = if succeeded % 2 == 0 { "A" } else { "B" };
        assert_eq!(final_instance.current_state, expected);
        for (n, entry) in final_instance.history.iter().enumerate() {
            let want = if n % 2 == 0 { "forth" } else { "back" };
            assert_eq!(entry.action, want);
        }
    }
}
