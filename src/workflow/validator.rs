/// Structural validation of workflow definitions
///
/// Runs before a definition is accepted by the HTTP boundary. Every violation is
/// reported; checks never short-circuit. Reachability, final-state presence and
/// graph connectivity are deliberately outside its scope.

use crate::error::EngineError;
use crate::workflow::types::WorkflowDefinition;
use std::collections::HashSet;

/// Check a definition and return one message per violation (empty = valid)
pub fn validate(def: &WorkflowDefinition) -> Vec<String> {
    let mut errors = Vec::new();

    let initial_count = def.states.iter().filter(|s| s.is_initial).count();
    if initial_count != 1 {
        errors.push(format!(
            "There must be exactly one initial state (found {}).",
            initial_count
        ));
    }

    let state_ids: HashSet<&str> = def.states.iter().map(|s| s.id.as_str()).collect();
    if state_ids.len() != def.states.len() {
        errors.push("Duplicate state IDs found.".to_string());
    }

    let action_ids: HashSet<&str> = def.actions.iter().map(|a| a.id.as_str()).collect();
    if action_ids.len() != def.actions.len() {
        errors.push("Duplicate action IDs found.".to_string());
    }

    for action in &def.actions {
        for from in &action.from_states {
            if !state_ids.contains(from.as_str()) {
                errors.push(format!(
                    "Action '{}' refers to invalid fromState '{}'.",
                    action.id, from
                ));
            }
        }
        if !state_ids.contains(action.to_state.as_str()) {
            errors.push(format!(
                "Action '{}' refers to invalid toState '{}'.",
                action.id, action.to_state
            ));
        }
    }

    errors
}

/// Validation outcome bundled for callers that want a `Result`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    pub fn of(def: &WorkflowDefinition) -> Self {
        Self { errors: validate(def) }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), EngineError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Action, State};

    fn state(id: &str, initial: bool) -> State {
        State { id: id.into(), enabled: true, is_initial: initial, is_final: false }
    }

    fn action(id: &str, from: &[&str], to: &str) -> Action {
        Action {
            id: id.into(),
            enabled: true,
            from_states: from.iter().map(|s| s.to_string()).collect(),
            to_state: to.into(),
        }
    }

    fn approval() -> WorkflowDefinition {
        WorkflowDefinition {
            slug: "approval".into(),
            states: vec![state("draft", true), state("review", false), state("approved", false)],
            actions: vec![
                action("submit", &["draft"], "review"),
                action("approve", &["review"], "approved"),
                action("reopen", &["review", "approved"], "draft"),
            ],
        }
    }

    #[test]
    fn well_formed_definition_passes() {
        assert!(validate(&approval()).is_empty());
        assert!(ValidationReport::of(&approval()).into_result().is_ok());
    }

    #[test]
    fn reports_initial_state_count() {
        let mut def = approval();
        def.states[0].is_initial = false;
        assert_eq!(validate(&def), vec!["There must be exactly one initial state (found 0)."]);

        def.states[0].is_initial = true;
        def.states[1].is_initial = true;
        assert_eq!(validate(&def), vec!["There must be exactly one initial state (found 2)."]);
    }

    #[test]
    fn disabled_initial_state_still_counts() {
        let mut def = approval();
        def.states[0].enabled = false;
        assert!(validate(&def).is_empty());
    }

    #[test]
    fn reports_duplicate_ids() {
        let mut def = approval();
        def.states.push(state("review", false));
        def.actions.push(action("submit", &["draft"], "review"));

        let errors = validate(&def);
        assert!(errors.contains(&"Duplicate state IDs found.".to_string()));
        assert!(errors.contains(&"Duplicate action IDs found.".to_string()));
    }

    #[test]
    fn reports_each_dangling_reference() {
        let mut def = approval();
        def.actions.push(action("escalate", &["review", "limbo", "void"], "nowhere"));

        let errors = validate(&def);
        assert_eq!(
            errors,
            vec![
                "Action 'escalate' refers to invalid fromState 'limbo'.",
                "Action 'escalate' refers to invalid fromState 'void'.",
                "Action 'escalate' refers to invalid toState 'nowhere'.",
            ]
        );
    }

    #[test]
    fn collects_every_violation_together() {
        let def = WorkflowDefinition {
            slug: "broken".into(),
            states: vec![state("a", false), state("a", false)],
            actions: vec![action("go", &["x"], "a")],
        };

        let report = ValidationReport::of(&def);
        assert!(!report.is_valid());
        assert_eq!(report.errors().len(), 3);
        match report.into_result() {
            Err(EngineError::Validation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
