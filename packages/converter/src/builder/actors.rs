//! Actors, state machines, flows and sessions.

use super::keys::ColumnKey;
use super::state_machine::{reconstruct, TransitionRow};
use super::RepositoryBuilder;
use crate::document::{Detail, DetailTable};
use crate::repository::Identifier;

impl RepositoryBuilder {
    /// Rebuild a state machine of `actor` from its transition table.
    pub(super) fn add_transitions(&mut self, actor: &str, machine: &str, table: &DetailTable) {
        let cells: Vec<(Option<String>, Option<String>, TransitionRow)> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                let transition = TransitionRow {
                    name: row
                        .text(ColumnKey::Transition)
                        .or_else(|| row.text(ColumnKey::Name)),
                    when: row.text(ColumnKey::When),
                    documentation: row.text(ColumnKey::Documentation),
                    ..TransitionRow::default()
                };
                (row.text(ColumnKey::State), row.text(ColumnKey::Target), transition)
            })
            .collect();

        let mut rows = Vec::with_capacity(cells.len());
        for (index, (state, target, mut transition)) in cells.into_iter().enumerate() {
            let (Some(state), Some(target)) = (state, target) else {
                self.diagnostics.error(format!(
                    "State machine {machine} row {}: a transition needs a state and a target",
                    index + 1
                ));
                continue;
            };
            transition.state = state;
            transition.target = target;
            rows.push(transition);
        }

        let rebuilt = reconstruct(&rows);
        if !rows.is_empty() && rebuilt.initial.is_none() {
            self.diagnostics.error(format!(
                "State machine {machine} of actor {actor} has no initial state"
            ));
        }

        let target = self
            .repository
            .actor_mut(actor)
            .and_then(|a| a.state_machines.iter_mut().find(|m| m.name == machine));
        if let Some(state_machine) = target {
            tracing::debug!(
                actor,
                machine,
                states = rebuilt.states.len() + usize::from(rebuilt.initial.is_some()),
                "State machine rebuilt"
            );
            state_machine.initial = rebuilt.initial;
            state_machine.states = rebuilt.states;
        }
    }

    /// Endpoints and reliability of the flow declared by the enclosing heading.
    pub(super) fn describe_flow(&mut self, flow: &str, detail: &Detail) {
        let row = self.config.keys.row(detail);
        let source = row.text(ColumnKey::Source);
        let destination = row.text(ColumnKey::Destination);
        let reliability = row.text(ColumnKey::Reliability);
        let documentation = row.text(ColumnKey::Documentation);

        let Some(target) = self.repository.flow_mut(flow) else {
            return;
        };
        target.source = source.or(target.source.take());
        target.destination = destination.or(target.destination.take());
        target.reliability = reliability.or(target.reliability.take());
        if let Some(text) = documentation {
            target.annotation.push(None, text);
        }
    }

    /// Session identifiers, one per row.
    pub(super) fn add_identifiers(&mut self, session: &str, table: &DetailTable) {
        let rows: Vec<(Option<String>, Option<String>, Option<String>)> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                (
                    row.text(ColumnKey::Name),
                    row.text(ColumnKey::Value),
                    row.text(ColumnKey::Documentation),
                )
            })
            .collect();

        let mut identifiers = Vec::new();
        for (index, (name, value, documentation)) in rows.into_iter().enumerate() {
            let Some(name) = name else {
                self.diagnostics.error(format!(
                    "Session {session} row {}: identifier has no name",
                    index + 1
                ));
                continue;
            };
            let mut identifier = Identifier {
                name,
                value,
                ..Identifier::default()
            };
            if let Some(text) = documentation {
                identifier.annotation.push(None, text);
            }
            identifiers.push(identifier);
        }

        if let Some(target) = self.repository.session_mut(session) {
            target.identifiers.extend(identifiers);
        }
    }
}
