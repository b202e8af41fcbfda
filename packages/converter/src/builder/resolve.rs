//! Draining the deferred queue once the document has been read.

use super::deferred::{MemberSlot, PendingStep};
use super::RepositoryBuilder;
use crate::repository::{
    CopyRequest, EntityKind, Lookup, Resolved, Source, Target, IMMEDIATE_ORDER, LOOKUP_ORDER,
    REFERENCE_ORDER,
};

impl RepositoryBuilder {
    /// Run queued steps in FIFO order until none are left, including steps
    /// queued while draining.
    pub(super) fn drain(&mut self) {
        let mut steps = 0usize;
        while let Some(step) = self.queue.pop() {
            steps += 1;
            match step {
                PendingStep::ResolveFieldRef {
                    slot,
                    target,
                    scenario,
                } => self.resolve_ref(EntityKind::Field, &slot, &target, &scenario),
                PendingStep::ResolveComponentRef {
                    slot,
                    target,
                    scenario,
                } => self.resolve_ref(EntityKind::Component, &slot, &target, &scenario),
                PendingStep::ResolveGroupRef {
                    slot,
                    target,
                    scenario,
                } => self.resolve_ref(EntityKind::Group, &slot, &target, &scenario),
                PendingStep::ResolveResponse {
                    message,
                    message_scenario,
                    index,
                    target,
                    scenario,
                } => self.resolve_response(&message, &message_scenario, index, &target, &scenario),
                PendingStep::ResolveFieldType {
                    field,
                    scenario,
                    type_name,
                } => self.resolve_field_type(&field, &scenario, &type_name),
                PendingStep::CopyMember(request) => self.copy_nested(&request),
            }
        }
        tracing::debug!(steps, "Deferred queue drained");
    }

    /// Find `target` in the working model, else copy it from the reference,
    /// and point the slot at it.
    fn resolve_ref(
        &mut self,
        kind: EntityKind,
        slot: &MemberSlot,
        target: &Target,
        scenario: &str,
    ) {
        let found = Lookup::new(&self.repository, self.reference.as_ref())
            .find(&LOOKUP_ORDER, kind, target, scenario);
        let resolved = match found {
            Some((strategy, resolved)) if strategy.source == Source::Working => Some(resolved),
            Some((_, resolved)) => self.copy_from_reference(kind, &resolved),
            None => None,
        };

        let Some(resolved) = resolved else {
            self.diagnostics.error(format!(
                "Unresolved {kind} reference '{target}' (scenario {scenario}) in {}",
                slot.owner
            ));
            return;
        };
        if !self.update_slot(slot, resolved.id, &resolved.scenario) {
            tracing::debug!(owner = %slot.owner, "Member slot no longer exists");
        }
    }

    /// Copy an entity found in the reference and queue its dependencies.
    fn copy_from_reference(&mut self, kind: EntityKind, found: &Resolved) -> Option<Resolved> {
        let reference = self.reference.as_ref()?;
        let outcome = self.repository.copy_member(
            reference,
            kind,
            &Target::Name(found.name.clone()),
            &found.scenario,
            self.config.copy_depth,
        )?;
        for request in outcome.nested {
            self.queue.push(PendingStep::CopyMember(request));
        }
        Some(outcome.resolved)
    }

    /// Nested copy of an entity that an earlier copy depends on.
    fn copy_nested(&mut self, request: &CopyRequest) {
        let lookup = Lookup::new(&self.repository, self.reference.as_ref());
        if lookup
            .find(&IMMEDIATE_ORDER, request.kind, &request.target, &request.scenario)
            .is_some()
        {
            return;
        }
        let Some((_, found)) =
            lookup.find(&REFERENCE_ORDER, request.kind, &request.target, &request.scenario)
        else {
            self.diagnostics.warn(format!(
                "Nested {} '{}' (scenario {}) not found in the reference",
                request.kind, request.target, request.scenario
            ));
            return;
        };

        let Some(reference) = self.reference.as_ref() else {
            return;
        };
        let outcome = self.repository.copy_member(
            reference,
            request.kind,
            &Target::Name(found.name),
            &found.scenario,
            request.depth,
        );
        for nested in outcome.into_iter().flat_map(|o| o.nested) {
            self.queue.push(PendingStep::CopyMember(nested));
        }
    }

    fn resolve_response(
        &mut self,
        message: &str,
        message_scenario: &str,
        index: usize,
        target: &str,
        scenario: &str,
    ) {
        let wanted = Target::Name(target.to_string());
        let found = Lookup::new(&self.repository, self.reference.as_ref()).first(
            &LOOKUP_ORDER,
            scenario,
            |adapter, scenario| {
                adapter
                    .message(&wanted, scenario)
                    .map(|m| (m.msg_type.clone(), m.scenario.clone()))
            },
        );
        let Some((_, (msg_type, found_scenario))) = found else {
            self.diagnostics.error(format!(
                "Unresolved response message '{target}' (scenario {scenario}) in message {message}"
            ));
            return;
        };

        let response = self
            .repository
            .message_mut(&Target::Name(message.to_string()), message_scenario)
            .and_then(|m| m.responses.get_mut(index));
        if let Some(response) = response {
            response.message_ref.msg_type = msg_type;
            response.message_ref.scenario = found_scenario;
        }
    }

    /// Copy a field's code set or datatype from the reference when the
    /// working model does not define it.
    fn resolve_field_type(&mut self, field: &str, scenario: &str, type_name: &str) {
        let wanted = Target::Name(type_name.to_string());
        let lookup = Lookup::new(&self.repository, self.reference.as_ref());
        let defined = lookup
            .find(&LOOKUP_ORDER[..2], EntityKind::CodeSet, &wanted, scenario)
            .is_some()
            || self.repository.datatype(type_name).is_some();
        if defined {
            return;
        }

        let found = lookup
            .find(&REFERENCE_ORDER, EntityKind::CodeSet, &wanted, scenario)
            .map(|(_, r)| (EntityKind::CodeSet, r))
            .or_else(|| {
                lookup
                    .find(&REFERENCE_ORDER, EntityKind::Datatype, &wanted, scenario)
                    .map(|(_, r)| (EntityKind::Datatype, r))
            });
        let Some((kind, resolved)) = found else {
            tracing::debug!(field, type_name, "Field type not found in the reference");
            return;
        };
        self.copy_from_reference(kind, &resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildOutput;
    use crate::config::BuilderConfig;
    use crate::diagnostics::Severity;
    use crate::markdown::{emit_events, parse};
    use crate::repository::{
        Code, CodeSet, Component, CopyDepth, Field, FieldRef, Member, RepositoryAdapter,
    };
    use pretty_assertions::assert_eq;

    fn reference() -> RepositoryAdapter {
        let mut adapter = RepositoryAdapter::new();
        adapter.add_code_set(CodeSet {
            name: "SideCodeSet".to_string(),
            id: 54,
            codes: vec![Code {
                name: "Buy".to_string(),
                id: 54001,
                value: "1".to_string(),
                ..Code::default()
            }],
            ..CodeSet::default()
        });
        adapter.add_field(Field {
            name: "Side".to_string(),
            id: 54,
            type_name: Some("SideCodeSet".to_string()),
            ..Field::default()
        });
        adapter.add_field(Field {
            name: "Symbol".to_string(),
            id: 55,
            ..Field::default()
        });
        adapter.add_component(Component {
            name: "Instrument".to_string(),
            id: 1003,
            members: vec![Member::Field(FieldRef {
                id: 55,
                ..FieldRef::default()
            })],
            ..Component::default()
        });
        adapter
    }

    fn build(markdown: &str, config: BuilderConfig) -> BuildOutput {
        let mut builder = RepositoryBuilder::with_reference(config, Some(reference())).unwrap();
        emit_events(&parse(markdown), &mut builder);
        builder.finish()
    }

    #[test]
    fn test_field_copied_with_code_set() {
        let output = build(
            "## Message Order type D\n\n| Name | Tag |\n|---|---|\n| Side | 54 |\n",
            BuilderConfig::default(),
        );
        assert_eq!(output.diagnostics.error_count(), 0);
        let repository = &output.repository;
        assert_eq!(repository.fields[0].name, "Side");
        assert_eq!(repository.code_sets[0].codes[0].id, 54001);
    }

    #[test]
    fn test_component_copy_depth() {
        let markdown = "## Message Order type D\n\n| Name | Tag |\n|---|---|\n| Instrument | component |\n";

        let shallow = build(
            markdown,
            BuilderConfig::default().with_copy_depth(CopyDepth::Limited(0)),
        );
        assert_eq!(shallow.repository.components[0].id, 1003);
        assert!(shallow.repository.fields.is_empty());

        let deep = build(markdown, BuilderConfig::default());
        assert_eq!(deep.repository.fields[0].name, "Symbol");
        assert_eq!(deep.repository.messages[0].members[0].id(), 1003);
    }

    #[test]
    fn test_field_type_from_reference() {
        let output = build(
            "## Fields\n\n| Name | Tag | Type |\n|---|---|---|\n| Side | 54 | SideCodeSet |\n",
            BuilderConfig::default(),
        );
        assert_eq!(output.repository.code_sets.len(), 1);
        assert_eq!(output.repository.code_sets[0].name, "SideCodeSet");
    }

    #[test]
    fn test_default_scenario_fallback() {
        let output = build(
            "## Message Order type D scenario Retail\n\n| Name | Tag | Scenario |\n|---|---|---|\n| Symbol | 55 | Retail |\n",
            BuilderConfig::default(),
        );
        let member = &output.repository.messages[0].members[0];
        assert_eq!(member.id(), 55);
        assert_eq!(member.scenario(), "base");
        assert_eq!(output.diagnostics.count(Severity::Error), 0);
    }
}
