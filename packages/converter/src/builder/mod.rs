//! Repository builder: turns the document event stream into a repository.
//!
//! The builder is the single consumer of [`DocumentEvent`]s. Each event is
//! routed to the section that owns it (see [`locate`]):
//!
//! - a heading at the section's own level declares an entity, which becomes
//!   the active entity for that heading;
//! - documentation is appended to the active entity's annotation;
//! - tables (and, for flows, flat details) supply the
//!   entity's members or attributes.
//!
//! References that cannot be resolved while the document is still being read
//! are queued as [`PendingStep`]s and retried by [`RepositoryBuilder::finish`]
//! against the completed model and the optional reference model.

mod actors;
mod codes;
mod declare;
mod deferred;
mod fields;
mod keys;
mod members;
mod metadata;
mod presence;
mod resolve;
mod section;
mod state_machine;

use std::rc::Rc;

pub use codes::{looks_like_codes, parse_inline_codes, InlineCode, InlineCodes};
pub use deferred::{DeferredQueue, MemberOwner, MemberSlot, PendingStep, SlotPosition};
pub use keys::{ColumnKey, KeyTable, Row};
pub use presence::{parse_presence, CellError, MemberPresence};
pub use section::{locate, Located, SectionKind};
pub use state_machine::{reconstruct, Reconstructed, TransitionRow};

use crate::config::BuilderConfig;
use crate::diagnostics::Diagnostics;
use crate::document::{Context, DocumentConsumer, DocumentEvent, Documentation};
use crate::error::Result;
use crate::idgen::IdGenerator;
use crate::repository::{Annotation, Repository, RepositoryAdapter, RepositoryWriter, Target};

/// Entity declared by a heading, addressed by its key.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntityRef {
    Datatype(String),
    CodeSet { name: String, scenario: String },
    Field { name: String, scenario: String },
    Component { name: String, scenario: String },
    Group { name: String, scenario: String },
    Message { name: String, scenario: String },
    Actor(String),
    StateMachine { actor: String, name: String },
    Flow(String),
    Session(String),
}

#[derive(Debug)]
struct ActiveEntity {
    context: Rc<Context>,
    entity: EntityRef,
}

/// Finished repository and everything recorded while building it.
#[derive(Debug)]
pub struct BuildOutput {
    pub repository: Repository,
    pub diagnostics: Diagnostics,
}

/// Stateful consumer of document events.
pub struct RepositoryBuilder {
    config: BuilderConfig,
    ids: IdGenerator,
    repository: RepositoryAdapter,
    reference: Option<RepositoryAdapter>,
    queue: DeferredQueue,
    diagnostics: Diagnostics,
    active: Vec<ActiveEntity>,
}

impl RepositoryBuilder {
    /// Create a builder without a reference model.
    pub fn new(config: BuilderConfig) -> Result<Self> {
        Self::with_reference(config, None)
    }

    /// Create a builder that fills gaps from `reference`.
    pub fn with_reference(
        config: BuilderConfig,
        reference: Option<RepositoryAdapter>,
    ) -> Result<Self> {
        config.validate()?;
        let ids = IdGenerator::new(config.id_min, config.id_max)?;
        Ok(Self {
            config,
            ids,
            repository: RepositoryAdapter::new(),
            reference,
            queue: DeferredQueue::new(),
            diagnostics: Diagnostics::new(),
            active: Vec::new(),
        })
    }

    /// The model as built so far.
    #[must_use]
    pub fn repository(&self) -> &RepositoryAdapter {
        &self.repository
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Steps waiting for [`RepositoryBuilder::finish`].
    #[must_use]
    pub fn pending(&self) -> &DeferredQueue {
        &self.queue
    }

    /// Route one event to its section.
    pub fn accept(&mut self, event: DocumentEvent) {
        let context = Rc::clone(event.context());
        if let DocumentEvent::Heading(heading) = &event {
            let level = heading.level();
            self.active.retain(|a| a.context.level() < level);
        }

        match locate(&context) {
            Located::Root => self.on_root(event),
            Located::Unknown(heading) => {
                if matches!(event, DocumentEvent::Heading(_)) && heading.is(&context) {
                    self.diagnostics
                        .warn(format!("Unknown section '{}' ignored", heading.keys().join(" ")));
                } else {
                    tracing::debug!(
                        section = %heading.keys().join(" "),
                        "Skipping event in unknown section"
                    );
                }
            }
            Located::Section { kind, context: section } => match event {
                DocumentEvent::Heading(heading) => {
                    if section.is(&heading) {
                        self.declare(kind, &heading);
                    }
                }
                DocumentEvent::Documentation(doc) => self.on_documentation(kind, section, &doc),
                DocumentEvent::DetailTable(table) => self.on_table(kind, section, &table),
                DocumentEvent::Detail(detail) => self.on_detail(kind, section, &detail),
            },
        }
    }

    /// Run all deferred steps and hand out the result.
    #[must_use]
    pub fn finish(mut self) -> BuildOutput {
        self.drain();
        tracing::info!(
            diagnostics = self.diagnostics.len(),
            errors = self.diagnostics.error_count(),
            "Repository built"
        );
        BuildOutput {
            repository: self.repository.into_repository(),
            diagnostics: self.diagnostics,
        }
    }

    /// Finish and serialize through `writer`.
    pub fn write(self, writer: &mut dyn RepositoryWriter) -> Result<BuildOutput> {
        let output = self.finish();
        writer.write_repository(&output.repository)?;
        Ok(output)
    }

    /// Context whose active entity events of a `kind` section target.
    ///
    /// Member tables nested under an entity heading belong to that entity.
    fn anchor<'c>(kind: SectionKind, section: &'c Context) -> Option<&'c Context> {
        match kind {
            SectionKind::Responses | SectionKind::Variables | SectionKind::Identifiers => {
                section.parent().map(|p| &**p)
            }
            _ => Some(section),
        }
    }

    fn active_at(&self, context: &Context) -> Option<&EntityRef> {
        self.active
            .iter()
            .rev()
            .find(|a| a.context.is(context))
            .map(|a| &a.entity)
    }

    fn entity_for(&self, kind: SectionKind, section: &Context) -> Option<EntityRef> {
        Self::anchor(kind, section)
            .and_then(|anchor| self.active_at(anchor))
            .cloned()
    }

    fn activate(&mut self, context: &Rc<Context>, entity: EntityRef) {
        self.active.push(ActiveEntity {
            context: Rc::clone(context),
            entity,
        });
    }

    fn on_documentation(&mut self, kind: SectionKind, section: &Context, doc: &Documentation) {
        let Some(anchor) = Self::anchor(kind, section) else {
            return;
        };
        let Some(entity) = self.active_at(anchor).cloned() else {
            tracing::debug!(section = ?kind, "Documentation without an entity");
            return;
        };
        let purpose = if doc.context().is(anchor) {
            None
        } else {
            doc.context().key(0).map(str::to_string)
        };
        match self.annotation_mut(&entity) {
            Some(annotation) => annotation.push(purpose, doc.text()),
            None => tracing::debug!(entity = ?entity, "Active entity no longer exists"),
        }
    }

    fn annotation_mut(&mut self, entity: &EntityRef) -> Option<&mut Annotation> {
        let repository = &mut self.repository;
        match entity {
            EntityRef::Datatype(name) => repository.datatype_mut(name).map(|d| &mut d.annotation),
            EntityRef::CodeSet { name, scenario } => repository
                .code_set_mut(&Target::Name(name.clone()), scenario)
                .map(|c| &mut c.annotation),
            EntityRef::Field { name, scenario } => repository
                .field_mut(&Target::Name(name.clone()), scenario)
                .map(|f| &mut f.annotation),
            EntityRef::Component { name, scenario } => repository
                .component_mut(&Target::Name(name.clone()), scenario)
                .map(|c| &mut c.annotation),
            EntityRef::Group { name, scenario } => repository
                .group_mut(&Target::Name(name.clone()), scenario)
                .map(|g| &mut g.annotation),
            EntityRef::Message { name, scenario } => repository
                .message_mut(&Target::Name(name.clone()), scenario)
                .map(|m| &mut m.annotation),
            EntityRef::Actor(name) => repository.actor_mut(name).map(|a| &mut a.annotation),
            EntityRef::StateMachine { actor, name } => repository
                .actor_mut(actor)
                .and_then(|a| a.state_machines.iter_mut().find(|m| &m.name == name))
                .map(|m| &mut m.annotation),
            EntityRef::Flow(name) => repository.flow_mut(name).map(|f| &mut f.annotation),
            EntityRef::Session(name) => repository.session_mut(name).map(|s| &mut s.annotation),
        }
    }
}

impl DocumentConsumer for RepositoryBuilder {
    fn consume(&mut self, event: DocumentEvent) {
        self.accept(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::markdown::{emit_events, parse};
    use crate::repository::{Member, Presence, YamlWriter};
    use pretty_assertions::assert_eq;

    fn build(markdown: &str) -> BuildOutput {
        build_with(markdown, None)
    }

    fn build_with(markdown: &str, reference: Option<RepositoryAdapter>) -> BuildOutput {
        let mut builder =
            RepositoryBuilder::with_reference(BuilderConfig::default(), reference).unwrap();
        emit_events(&parse(markdown), &mut builder);
        builder.finish()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BuilderConfig::default().with_id_range(10, 5);
        assert!(RepositoryBuilder::new(config).is_err());
    }

    #[test]
    fn test_repository_metadata() {
        let output = build(
            "# Orders version 2.1\n\nOrder entry protocol.\n\n| Term | Value |\n|---|---|\n| title | Orders |\n| publisher | Acme |\n",
        );
        let repository = output.repository;
        assert_eq!(repository.name, "Orders");
        assert_eq!(repository.version, "2.1");
        assert_eq!(repository.metadata.len(), 2);
        assert_eq!(repository.metadata[1].value, "Acme");
        assert_eq!(repository.annotation.0[0].text, "Order entry protocol.");
    }

    #[test]
    fn test_unknown_section_warned_once() {
        let output = build("# P\n\n## Glossary\n\nWords.\n\n| Term | Meaning |\n|---|---|\n| a | b |\n");
        assert_eq!(output.diagnostics.count(Severity::Warn), 1);
        assert!(output.diagnostics.contains(Severity::Warn, "Glossary"));
        assert!(output.repository.metadata.is_empty());
    }

    #[test]
    fn test_documentation_purpose() {
        let output = build(
            "# P\n\n## Message Heartbeat type 0\n\nKeeps the session alive.\n\n### Elaboration\n\nSent every interval.\n",
        );
        let annotation = &output.repository.messages[0].annotation.0;
        assert_eq!(annotation.len(), 2);
        assert_eq!(annotation[0].purpose, None);
        assert_eq!(annotation[1].purpose.as_deref(), Some("Elaboration"));
        assert_eq!(annotation[1].text, "Sent every interval.");
    }

    #[test]
    fn test_message_heading_attributes() {
        let output = build("## Message NewOrderSingle type D category SingleGeneralOrderHandling (14)\n");
        let message = &output.repository.messages[0];
        assert_eq!(message.name, "NewOrderSingle");
        assert_eq!(message.msg_type, "D");
        assert_eq!(message.id, 14);
        assert_eq!(message.category.as_deref(), Some("SingleGeneralOrderHandling"));
        assert_eq!(message.scenario, "base");
    }

    #[test]
    fn test_generated_id_in_range() {
        let output = build("## Component Instrument\n");
        let component = &output.repository.components[0];
        assert!((5000..40000).contains(&component.id));
    }

    #[test]
    fn test_forward_reference_by_tag() {
        let output = build(
            "## Component Header\n\n| Name | Tag | Presence |\n|---|---|---|\n| SenderCompID | 49 | required |\n| TargetCompID | 56 | required |\n\n## Fields\n\n| Name | Tag | Type |\n|---|---|---|\n| SenderCompID | 49 | String |\n| TargetCompID | 56 | String |\n",
        );
        assert_eq!(output.diagnostics.error_count(), 0);
        let ids: Vec<u32> = output.repository.components[0]
            .members
            .iter()
            .map(Member::id)
            .collect();
        assert_eq!(ids, vec![49, 56]);
        assert_eq!(output.repository.fields.len(), 2);
    }

    #[test]
    fn test_forward_reference_by_name() {
        let output = build(
            "## Message Logon type A\n\n| Name | Tag | Presence |\n|---|---|---|\n| HeartBtInt |  | required |\n| Parties | group | optional |\n\n## Group Parties\n\n| Name | Tag |\n|---|---|\n| NoPartyIDs | 453 |\n| PartyID | 448 |\n\n## Fields\n\n| Name | Tag | Type |\n|---|---|---|\n| HeartBtInt | 108 | int |\n| NoPartyIDs | 453 | NumInGroup |\n| PartyID | 448 | String |\n",
        );
        assert_eq!(output.diagnostics.error_count(), 0, "{:?}", output.diagnostics);
        let message = &output.repository.messages[0];
        assert_eq!(message.members[0].id(), 108);
        assert_eq!(message.members[1].id(), output.repository.groups[0].id);
        let group = &output.repository.groups[0];
        assert_eq!(group.num_in_group.as_ref().map(|r| r.id), Some(453));
        assert_eq!(group.members.len(), 1);
    }

    #[test]
    fn test_unresolved_reference_is_error() {
        let output = build("## Component Header\n\n| Name | Tag |\n|---|---|\n| Mystery | 9999 |\n");
        assert_eq!(output.diagnostics.error_count(), 1);
        assert!(output.diagnostics.contains(Severity::Error, "9999"));
        assert_eq!(output.repository.components[0].members[0].id(), 9999);
    }

    #[test]
    fn test_presence_and_constant() {
        let output = build(
            "## Fields\n\n| Name | Tag |\n|---|---|\n| BeginString | 8 |\n| OrdType | 40 |\n| Price | 44 |\n\n## Component Header\n\n| Name | Tag | Presence | Values |\n|---|---|---|---|\n| BeginString | 8 |  | FIXT.1.1 |\n| Price | 44 | required when OrdType=2 |  |\n",
        );
        let members = &output.repository.components[0].members;
        let Member::Field(begin) = &members[0] else {
            panic!("expected field");
        };
        assert_eq!(begin.presence, Presence::Constant);
        assert_eq!(begin.value.as_deref(), Some("FIXT.1.1"));
        let Member::Field(price) = &members[1] else {
            panic!("expected field");
        };
        assert_eq!(price.rules[0].when, "OrdType=2");
    }

    #[test]
    fn test_bad_presence_logged() {
        let output = build(
            "## Fields\n\n| Name | Tag |\n|---|---|\n| Side | 54 |\n\n## Component C\n\n| Name | Tag | Presence |\n|---|---|---|\n| Side | 54 | mandatory |\n",
        );
        assert!(output.diagnostics.contains(Severity::Error, "mandatory"));
        let members = &output.repository.components[0].members;
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn test_write_serializes() {
        let mut builder = RepositoryBuilder::new(BuilderConfig::default()).unwrap();
        emit_events(&parse("# Orders\n\n## Fields\n\n| Name | Tag |\n|---|---|\n| Side | 54 |\n"), &mut builder);
        let mut writer = YamlWriter::new(Vec::new());
        let output = builder.write(&mut writer).unwrap();
        let yaml = String::from_utf8(writer.into_inner()).unwrap();
        assert!(yaml.starts_with("name: Orders\n"));
        assert!(yaml.contains("name: Side"));
        assert_eq!(output.repository.fields[0].id, 54);
    }
}
