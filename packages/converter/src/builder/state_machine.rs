//! Rebuilding states from a flat transition table.

use indexmap::IndexSet;

use crate::repository::{Annotation, State, Transition};

/// One row of a state machine table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRow {
    pub state: String,
    pub target: String,
    /// Transition name; the target name is used when absent.
    pub name: Option<String>,
    pub when: Option<String>,
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconstructed {
    pub initial: Option<State>,
    pub states: Vec<State>,
}

/// Turn transition rows into states.
///
/// The initial state is the first source state (in row order) that no row
/// targets. All other states named as a source or a target follow in
/// first-seen order, sources before targets. Each row becomes a transition
/// of its source state.
///
/// # Examples
/// ```
/// use mdorchestra_converter::builder::{reconstruct, TransitionRow};
///
/// let row = |state: &str, target: &str| TransitionRow {
///     state: state.to_string(),
///     target: target.to_string(),
///     ..TransitionRow::default()
/// };
/// let machine = reconstruct(&[row("A", "B"), row("B", "C")]);
/// assert_eq!(machine.initial.map(|s| s.name).as_deref(), Some("A"));
/// assert_eq!(machine.states.len(), 2);
/// ```
#[must_use]
pub fn reconstruct(rows: &[TransitionRow]) -> Reconstructed {
    let sources: IndexSet<&str> = rows.iter().map(|r| r.state.as_str()).collect();
    let targets: IndexSet<&str> = rows.iter().map(|r| r.target.as_str()).collect();

    let initial_name = sources.iter().find(|s| !targets.contains(*s)).copied();

    let mut names: IndexSet<&str> = sources.clone();
    names.extend(targets.iter().copied());

    let mut initial = None;
    let mut states = Vec::new();
    for name in names {
        let state = State {
            name: name.to_string(),
            transitions: transitions_from(rows, name),
            annotation: Annotation::default(),
        };
        if Some(name) == initial_name {
            initial = Some(state);
        } else {
            states.push(state);
        }
    }

    Reconstructed { initial, states }
}

fn transitions_from(rows: &[TransitionRow], state: &str) -> Vec<Transition> {
    rows.iter()
        .filter(|r| r.state == state)
        .map(|r| {
            let mut annotation = Annotation::default();
            if let Some(text) = &r.documentation {
                annotation.push(None, text.clone());
            }
            Transition {
                name: r.name.clone().unwrap_or_else(|| r.target.clone()),
                target: r.target.clone(),
                when: r.when.clone(),
                annotation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(state: &str, target: &str) -> TransitionRow {
        TransitionRow {
            state: state.to_string(),
            target: target.to_string(),
            ..TransitionRow::default()
        }
    }

    fn names(states: &[State]) -> Vec<&str> {
        states.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_chain_has_initial() {
        let machine = reconstruct(&[row("A", "B"), row("B", "C")]);
        let initial = machine.initial.unwrap();
        assert_eq!(initial.name, "A");
        assert_eq!(initial.transitions[0].target, "B");
        assert_eq!(names(&machine.states), vec!["B", "C"]);
    }

    #[test]
    fn test_cycle_has_no_initial() {
        let machine = reconstruct(&[row("A", "B"), row("B", "A"), row("B", "C")]);
        assert!(machine.initial.is_none());
        assert_eq!(names(&machine.states), vec!["A", "B", "C"]);
        assert_eq!(machine.states[1].transitions.len(), 2);
    }

    #[test]
    fn test_transition_name_and_condition() {
        let rows = vec![TransitionRow {
            state: "New".to_string(),
            target: "Filled".to_string(),
            name: Some("Fill".to_string()),
            when: Some("CumQty = OrderQty".to_string()),
            documentation: Some("Fully executed".to_string()),
        }];
        let machine = reconstruct(&rows);
        let transition = &machine.initial.unwrap().transitions[0];
        assert_eq!(transition.name, "Fill");
        assert_eq!(transition.when.as_deref(), Some("CumQty = OrderQty"));
        assert!(!transition.annotation.is_empty());
    }

    #[test]
    fn test_default_transition_name_is_target() {
        let machine = reconstruct(&[row("New", "Canceled")]);
        assert_eq!(machine.initial.unwrap().transitions[0].name, "Canceled");
    }

    #[test]
    fn test_empty_rows() {
        assert_eq!(reconstruct(&[]), Reconstructed::default());
    }
}
