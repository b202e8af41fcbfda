//! Member rows of components, groups, messages and actors, and message
//! responses.

use super::deferred::{MemberOwner, MemberSlot, PendingStep, SlotPosition};
use super::keys::ColumnKey;
use super::presence::{parse_presence, MemberPresence};
use super::RepositoryBuilder;
use crate::config::DEFAULT_SCENARIO;
use crate::document::DetailTable;
use crate::repository::{
    Annotation, ComponentRef, EntityKind, FieldRef, GroupRef, Lookup, Member, MessageRef,
    Response, Target, IMMEDIATE_ORDER,
};

/// What a member row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Field,
    Component,
    Group,
}

impl MemberKind {
    fn entity(self) -> EntityKind {
        match self {
            Self::Field => EntityKind::Field,
            Self::Component => EntityKind::Component,
            Self::Group => EntityKind::Group,
        }
    }

    fn pending(self, slot: MemberSlot, target: Target, scenario: String) -> PendingStep {
        match self {
            Self::Field => PendingStep::ResolveFieldRef {
                slot,
                target,
                scenario,
            },
            Self::Component => PendingStep::ResolveComponentRef {
                slot,
                target,
                scenario,
            },
            Self::Group => PendingStep::ResolveGroupRef {
                slot,
                target,
                scenario,
            },
        }
    }

    fn member(
        self,
        id: u32,
        scenario: String,
        parsed: MemberPresence,
        annotation: Annotation,
    ) -> Member {
        match self {
            Self::Field => Member::Field(FieldRef {
                id,
                scenario,
                presence: parsed.presence,
                value: parsed.value,
                assign: parsed.assign,
                rules: parsed.rules,
                annotation,
            }),
            Self::Component => Member::Component(ComponentRef {
                id,
                scenario,
                presence: parsed.presence,
                rules: parsed.rules,
                annotation,
            }),
            Self::Group => Member::Group(GroupRef {
                id,
                scenario,
                presence: parsed.presence,
                rules: parsed.rules,
                annotation,
            }),
        }
    }
}

#[derive(Debug)]
struct MemberRow {
    name: Option<String>,
    tag: Option<String>,
    presence: Option<String>,
    values: Option<String>,
    scenario: String,
    documentation: Option<String>,
}

#[derive(Debug)]
struct ResponseRow {
    target: Option<String>,
    scenario: String,
    when: Option<String>,
    documentation: Option<String>,
}

impl RepositoryBuilder {
    /// Append one member per table row to `owner`.
    ///
    /// Targets already in the working model are resolved now; the rest keep
    /// a placeholder id (the row's tag, else 0) and are queued.
    pub(super) fn add_members(&mut self, owner: &MemberOwner, table: &DetailTable) {
        let rows: Vec<MemberRow> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                MemberRow {
                    name: row.text(ColumnKey::Name),
                    tag: row.text(ColumnKey::Tag),
                    presence: row.text(ColumnKey::Presence),
                    values: row.text(ColumnKey::Values),
                    scenario: row
                        .text(ColumnKey::Scenario)
                        .unwrap_or_else(|| DEFAULT_SCENARIO.to_string()),
                    documentation: row.text(ColumnKey::Documentation),
                }
            })
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            self.add_member(owner, index + 1, row);
        }
    }

    fn add_member(&mut self, owner: &MemberOwner, number: usize, row: MemberRow) {
        let (kind, target) = match (row.tag.as_deref(), &row.name) {
            (Some(tag), Some(name)) if tag.eq_ignore_ascii_case("component") => {
                (MemberKind::Component, Target::Name(name.clone()))
            }
            (Some(tag), Some(name)) if tag.eq_ignore_ascii_case("group") => {
                (MemberKind::Group, Target::Name(name.clone()))
            }
            (Some(tag), name) => match tag.parse() {
                Ok(id) => (MemberKind::Field, Target::Id(id)),
                Err(_) => {
                    self.diagnostics
                        .error(format!("{owner} row {number}: invalid tag '{tag}'"));
                    let Some(name) = name else { return };
                    (MemberKind::Field, Target::Name(name.clone()))
                }
            },
            (None, Some(name)) => (MemberKind::Field, Target::Name(name.clone())),
            (None, None) => {
                self.diagnostics
                    .error(format!("{owner} row {number}: member has no name or tag"));
                return;
            }
        };

        let (parsed, errors) = parse_presence(row.presence.as_deref(), row.values.as_deref());
        for error in errors {
            self.diagnostics
                .error(format!("{owner} row {number}: {error}"));
        }
        if let (Some(codes), Some(name), MemberKind::Field) = (&parsed.codes, &row.name, kind) {
            self.define_inline_codes(name, &row.scenario, codes, None);
        }

        let found = Lookup::new(&self.repository, self.reference.as_ref()).find(
            &IMMEDIATE_ORDER,
            kind.entity(),
            &target,
            &row.scenario,
        );
        let (id, scenario) = match &found {
            Some((_, resolved)) => (resolved.id, resolved.scenario.clone()),
            None => match &target {
                Target::Id(id) => (*id, row.scenario.clone()),
                Target::Name(_) => (0, row.scenario.clone()),
            },
        };

        let mut annotation = Annotation::default();
        if let Some(text) = row.documentation {
            annotation.push(None, text);
        }
        let member = kind.member(id, scenario, parsed, annotation);
        let Some(position) = self.place_member(owner, member) else {
            tracing::debug!(owner = %owner, "Member owner no longer exists");
            return;
        };

        if found.is_none() {
            let slot = MemberSlot {
                owner: owner.clone(),
                position,
            };
            tracing::debug!(owner = %owner, target = %target, "Deferring member reference");
            self.queue.push(kind.pending(slot, target, row.scenario));
        }
    }

    /// Store `member`; the first field of a group without a NumInGroup
    /// becomes its counter.
    fn place_member(&mut self, owner: &MemberOwner, member: Member) -> Option<SlotPosition> {
        if let MemberOwner::Group { name, scenario } = owner {
            let group = self
                .repository
                .group_mut(&Target::Name(name.clone()), scenario)?;
            return match member {
                Member::Field(counter) if group.num_in_group.is_none() => {
                    group.num_in_group = Some(counter);
                    Some(SlotPosition::NumInGroup)
                }
                member => {
                    group.members.push(member);
                    Some(SlotPosition::Member(group.members.len() - 1))
                }
            };
        }
        let members = self.members_mut(owner)?;
        members.push(member);
        Some(SlotPosition::Member(members.len() - 1))
    }

    fn members_mut(&mut self, owner: &MemberOwner) -> Option<&mut Vec<Member>> {
        let repository = &mut self.repository;
        match owner {
            MemberOwner::Component { name, scenario } => repository
                .component_mut(&Target::Name(name.clone()), scenario)
                .map(|c| &mut c.members),
            MemberOwner::Group { name, scenario } => repository
                .group_mut(&Target::Name(name.clone()), scenario)
                .map(|g| &mut g.members),
            MemberOwner::Message { name, scenario } => repository
                .message_mut(&Target::Name(name.clone()), scenario)
                .map(|m| &mut m.members),
            MemberOwner::Actor { name } => repository.actor_mut(name).map(|a| &mut a.members),
        }
    }

    /// Point a member slot at a resolved entity. Returns `false` when the
    /// slot no longer exists.
    pub(super) fn update_slot(&mut self, slot: &MemberSlot, id: u32, scenario: &str) -> bool {
        match (slot.position, &slot.owner) {
            (SlotPosition::NumInGroup, MemberOwner::Group { name, scenario: group_scenario }) => {
                let counter = self
                    .repository
                    .group_mut(&Target::Name(name.clone()), group_scenario)
                    .and_then(|g| g.num_in_group.as_mut());
                match counter {
                    Some(counter) => {
                        counter.id = id;
                        scenario.clone_into(&mut counter.scenario);
                        true
                    }
                    None => false,
                }
            }
            (SlotPosition::NumInGroup, _) => false,
            (SlotPosition::Member(index), owner) => {
                match self.members_mut(owner).and_then(|m| m.get_mut(index)) {
                    Some(member) => {
                        member.set_key(id, scenario);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Responses of a message: each row names the message sent in reply.
    pub(super) fn add_responses(
        &mut self,
        message: &str,
        message_scenario: &str,
        table: &DetailTable,
    ) {
        let rows: Vec<ResponseRow> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                ResponseRow {
                    target: row.text(ColumnKey::Name),
                    scenario: row
                        .text(ColumnKey::Scenario)
                        .unwrap_or_else(|| DEFAULT_SCENARIO.to_string()),
                    when: row.text(ColumnKey::When),
                    documentation: row.text(ColumnKey::Documentation),
                }
            })
            .collect();

        let owner_target = Target::Name(message.to_string());
        for (index, row) in rows.into_iter().enumerate() {
            let Some(target) = row.target else {
                self.diagnostics.error(format!(
                    "Message {message} response row {}: has no message name",
                    index + 1
                ));
                continue;
            };
            let found = self
                .repository
                .message(&Target::Name(target.clone()), &row.scenario)
                .map(|m| m.msg_type.clone());

            let mut annotation = Annotation::default();
            if let Some(text) = row.documentation {
                annotation.push(None, text);
            }
            let response = Response {
                name: None,
                when: row.when,
                message_ref: MessageRef {
                    name: target.clone(),
                    msg_type: found.clone().unwrap_or_default(),
                    scenario: row.scenario.clone(),
                },
                annotation,
            };
            let Some(owner) = self.repository.message_mut(&owner_target, message_scenario) else {
                return;
            };
            owner.responses.push(response);
            let position = owner.responses.len() - 1;

            if found.is_none() {
                self.queue.push(PendingStep::ResolveResponse {
                    message: message.to_string(),
                    message_scenario: message_scenario.to_string(),
                    index: position,
                    target,
                    scenario: row.scenario,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildOutput;
    use crate::config::BuilderConfig;
    use crate::diagnostics::Severity;
    use crate::markdown::{emit_events, parse};
    use crate::repository::Presence;
    use pretty_assertions::assert_eq;

    fn build(markdown: &str) -> BuildOutput {
        let mut builder = RepositoryBuilder::new(BuilderConfig::default()).unwrap();
        emit_events(&parse(markdown), &mut builder);
        builder.finish()
    }

    #[test]
    fn test_component_and_group_rows() {
        let output = build(
            "## Component Instrument\n\n| Name | Tag |\n|---|---|\n| Symbol | 55 |\n\n## Group Legs\n\n| Name | Tag |\n|---|---|\n| NoLegs | 555 |\n| LegSymbol | 600 |\n\n## Message Order type D\n\n| Name | Tag | Presence |\n|---|---|---|\n| Instrument | component | required |\n| Legs | Group |  |\n\n## Fields\n\n| Name | Tag |\n|---|---|\n| Symbol | 55 |\n| NoLegs | 555 |\n| LegSymbol | 600 |\n",
        );
        assert_eq!(output.diagnostics.error_count(), 0, "{:?}", output.diagnostics);
        let repository = &output.repository;
        let members = &repository.messages[0].members;
        assert!(matches!(&members[0], Member::Component(r) if r.presence == Presence::Required));
        assert_eq!(members[0].id(), repository.components[0].id);
        assert!(matches!(&members[1], Member::Group(_)));
        assert_eq!(members[1].id(), repository.groups[0].id);
    }

    #[test]
    fn test_immediate_resolution_by_name() {
        let output = build(
            "## Fields\n\n| Name | Tag |\n|---|---|\n| Account | 1 |\n\n## Component Parties\n\n| Name | Presence |\n|---|---|\n| Account | optional |\n",
        );
        assert_eq!(output.repository.components[0].members[0].id(), 1);
    }

    #[test]
    fn test_row_without_name_or_tag() {
        let output = build("## Component C\n\n| Name | Tag | Presence |\n|---|---|---|\n|  |  | required |\n");
        assert!(output.diagnostics.contains(Severity::Error, "row 1"));
        assert!(output.repository.components[0].members.is_empty());
    }

    #[test]
    fn test_assign_expression() {
        let output = build(
            "## Fields\n\n| Name | Tag |\n|---|---|\n| SeqNum | 34 |\n\n## Component Header\n\n| Name | Tag | Presence | Values |\n|---|---|---|---|\n| SeqNum | 34 | required assign | assign $nextSeq |\n",
        );
        let Member::Field(seq) = &output.repository.components[0].members[0] else {
            panic!("expected field");
        };
        assert_eq!(seq.presence, Presence::Required);
        assert_eq!(seq.assign.as_deref(), Some("$nextSeq"));
    }

    #[test]
    fn test_member_inline_codes() {
        let output = build(
            "## Fields\n\n| Name | Tag |\n|---|---|\n| Side | 54 |\n\n## Component C\n\n| Name | Tag | Values |\n|---|---|---|\n| Side | 54 | 1=Buy 2=Sell |\n",
        );
        assert_eq!(output.repository.code_sets[0].name, "SideCodeSet");
        assert_eq!(output.repository.fields[0].type_name.as_deref(), Some("SideCodeSet"));
    }

    #[test]
    fn test_responses_resolved_later() {
        let output = build(
            "## Message NewOrderSingle type D\n\n### Responses\n\n| Name | When | Description |\n|---|---|---|\n| ExecutionReport | accepted | Acknowledges |\n| OrderCancelReject | rejected |  |\n\n## Message ExecutionReport type 8\n",
        );
        let responses = &output.repository.messages[0].responses;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].message_ref.msg_type, "8");
        assert_eq!(responses[0].when.as_deref(), Some("accepted"));
        assert_eq!(output.diagnostics.error_count(), 1);
        assert!(output.diagnostics.contains(Severity::Error, "OrderCancelReject"));
    }
}
