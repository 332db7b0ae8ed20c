/// Transition rules
///
/// Pure functions deciding whether an action may fire and which actions are
/// currently available. The rules are checked in a fixed order; the first
/// failing rule decides the error.

use crate::error::TransitionError;
use crate::workflow::types::{ActionHistoryEntry, WorkflowDefinition, WorkflowInstance};
use chrono::{DateTime, Utc};

/// Apply `action_id` to `instance` according to `definition`
///
/// On success the instance moves to the action's destination and gains one
/// history entry stamped `at`. On failure the instance is not touched.
pub fn apply_action(
    definition: &WorkflowDefinition,
    instance: &mut WorkflowInstance,
    action_id: &str,
    at: DateTime<Utc>,
) -> Result<(), TransitionError> {
    let action = definition
        .enabled_action(action_id)
        .ok_or_else(|| TransitionError::ActionUnavailable { action: action_id.to_string() })?;

    if !action.fires_from(&instance.current_state) {
        return Err(TransitionError::NotValidFromState {
            action: action_id.to_string(),
            state: instance.current_state.clone(),
        });
    }

    let target = definition
        .states
        .iter()
        .find(|s| s.id == action.to_state && s.enabled)
        .ok_or_else(|| TransitionError::TargetUnavailable { state: action.to_state.clone() })?;

    instance.current_state = target.id.clone();
    instance.history.push(ActionHistoryEntry {
        action: action_id.to_string(),
        timestamp: at,
    });
    Ok(())
}

/// Ids of enabled actions that may fire from `current_state`, in definition order
pub fn available_actions(definition: &WorkflowDefinition, current_state: &str) -> Vec<String> {
    definition
        .actions
        .iter()
        .filter(|a| a.enabled && a.fires_from(current_state))
        .map(|a| a.id.clone())
        .collect()
}
