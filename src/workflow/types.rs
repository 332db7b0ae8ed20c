/// Core workflow type definitions
///
/// Defines workflow definitions (states and actions) and the instances that run
/// against them. These types are serialized to/from camelCase JSON both on the
/// HTTP boundary and in the snapshot file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable workflow template: a named finite-state machine
///
/// The slug is the primary key. States and actions keep their submitted order,
/// which is also the order available actions are reported in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// Globally unique identifier (e.g., "leave-request")
    pub slug: String,
    /// Vertices of the transition graph
    #[serde(default)]
    pub states: Vec<State>,
    /// Directed, possibly multi-source edges between states
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A node in a definition's transition graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// Unique within the owning definition
    pub id: String,
    /// Disabled states cannot be entered, nor used to seed an instance
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub is_initial: bool,
    /// Informational only; nothing requires a final state to be reachable
    #[serde(default)]
    pub is_final: bool,
}

/// A named transition rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Unique within the owning definition
    pub id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// States this action may fire from
    #[serde(default)]
    pub from_states: Vec<String>,
    /// Destination state id
    pub to_state: String,
}

/// One live execution of a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    /// Generated at creation, never changes
    pub instance_id: String,
    /// Slug of the owning definition, never changes
    pub definition_slug: String,
    pub current_state: String,
    /// Append-only log of committed transitions
    #[serde(default)]
    pub history: Vec<ActionHistoryEntry>,
    /// Copy of the definition taken at creation when the store pins definitions.
    /// Absent instances follow whatever definition currently lives under the slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_definition: Option<WorkflowDefinition>,
}

/// A committed transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionHistoryEntry {
    /// Id of the action performed
    pub action: String,
    /// When the transition was committed (UTC)
    pub timestamp: DateTime<Utc>,
}

fn enabled_by_default() -> bool {
    true
}

impl WorkflowDefinition {
    /// The state an instance is seeded at: the first one both initial and enabled
    pub fn initial_state(&self) -> Option<&State> {
        self.states.iter().find(|s| s.is_initial && s.enabled)
    }

    /// Look up an enabled action by id
    pub fn enabled_action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id && a.enabled)
    }
}

impl Action {
    /// Whether this action lists `state` among its sources
    pub fn fires_from(&self, state: &str) -> bool {
        self.from_states.iter().any(|s| s == state)
    }
}

impl WorkflowInstance {
    /// Create a fresh instance seeded at `initial_state`
    ///
    /// Ids are v4 UUIDs in their 32-character hex form.
    pub fn start(definition_slug: impl Into<String>, initial_state: impl Into<String>) -> Self {
        Self {
            instance_id: uuid::Uuid::new_v4().simple().to_string(),
            definition_slug: definition_slug.into(),
            current_state: initial_state.into(),
            history: Vec::new(),
            pinned_definition: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_reads_camel_case_and_defaults_flags() {
        let def: WorkflowDefinition = serde_json::from_value(json!({
            "slug": "review",
            "states": [
                { "id": "draft", "isInitial": true },
                { "id": "done", "isFinal": true, "enabled": false }
            ],
            "actions": [
                { "id": "finish", "fromStates": ["draft"], "toState": "done" }
            ]
        }))
        .unwrap();

        assert!(def.states[0].enabled);
        assert!(def.states[0].is_initial);
        assert!(!def.states[1].enabled);
        assert!(def.states[1].is_final);
        assert!(def.actions[0].enabled);
        assert!(def.actions[0].fires_from("draft"));
    }

    #[test]
    fn instance_serializes_without_pinned_copy_by_default() {
        let instance = WorkflowInstance::start("review", "draft");
        let value = serde_json::to_value(&instance).unwrap();

        assert_eq!(value["definitionSlug"], "review");
        assert_eq!(value["currentState"], "draft");
        assert_eq!(value["history"], json!([]));
        assert!(value.get("pinnedDefinition").is_none());
        assert_eq!(instance.instance_id.len(), 32);
    }

    #[test]
    fn initial_state_skips_disabled_candidates() {
        let def = WorkflowDefinition {
            slug: "s".into(),
            states: vec![
                State { id: "a".into(), enabled: false, is_initial: true, is_final: false },
                State { id: "b".into(), enabled: true, is_initial: true, is_final: false },
            ],
            actions: vec![],
        };
        assert_eq!(def.initial_state().map(|s| s.id.as_str()), Some("b"));
    }
}
