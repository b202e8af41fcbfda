//! Entity declarations from section headings and id assignment.

use std::rc::Rc;

use super::{EntityRef, RepositoryBuilder, SectionKind};
use crate::config::{heading_id, DEFAULT_SCENARIO, DUP_SUFFIX};
use crate::document::Context;
use crate::repository::{
    Actor, CodeSet, Component, Datatype, EntityKind, Flow, Group, Lookup, Message, Session,
    StateMachine, Target, ID_ORDER,
};

/// Name and trailing key/value pairs of an entity heading such as
/// `Message NewOrderSingle type D scenario Retail (14)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct HeadingAttributes {
    pub name: String,
    pub scenario: String,
    pub id: Option<u32>,
    pub category: Option<String>,
    pub abbr_name: Option<String>,
    pub type_name: Option<String>,
}

impl HeadingAttributes {
    /// Read attributes; `None` when the heading names no entity.
    pub fn read(context: &Context) -> Option<Self> {
        let name = context.key(1).filter(|n| heading_id(n).is_none())?;
        let value = |key: &str| context.key_value_from(2, key).map(str::to_string);
        Some(Self {
            name: name.to_string(),
            scenario: value("scenario").unwrap_or_else(|| DEFAULT_SCENARIO.to_string()),
            id: context.keys().iter().find_map(|k| heading_id(k)),
            category: value("category"),
            abbr_name: value("abbrName").or_else(|| value("abbreviation")),
            type_name: value("type"),
        })
    }
}

impl RepositoryBuilder {
    pub(super) fn declare(&mut self, kind: SectionKind, heading: &Rc<Context>) {
        let attributes = HeadingAttributes::read(heading);
        let entity = match (kind, attributes) {
            (SectionKind::Datatype, Some(a)) => Some(self.declare_datatype(a)),
            (SectionKind::CodeSet, Some(a)) => Some(self.declare_code_set(a)),
            (SectionKind::Field, Some(a)) => Some(self.declare_field(a)),
            (SectionKind::Component, Some(a)) => Some(self.declare_component(a)),
            (SectionKind::Group, Some(a)) => Some(self.declare_group(a)),
            (SectionKind::Message, Some(a)) => Some(self.declare_message(a)),
            (SectionKind::Actor, Some(a)) => Some(self.declare_actor(a)),
            (SectionKind::Flow, Some(a)) => Some(self.declare_flow(a)),
            (SectionKind::Session, Some(a)) => Some(self.declare_session(a)),
            (SectionKind::StateMachine, Some(a)) => self.declare_state_machine(heading, a),
            (SectionKind::Component | SectionKind::Group | SectionKind::Message, None) => {
                self.diagnostics.error(format!(
                    "Heading '{}' names no entity",
                    heading.keys().join(" ")
                ));
                None
            }
            _ => None,
        };
        if let Some(entity) = entity {
            tracing::debug!(entity = ?entity, level = heading.level(), "Declared");
            self.activate(heading, entity);
        }
    }

    /// Id for a new entity: explicit, else a known id for the same name,
    /// else generated from `seeds`.
    pub(super) fn assign_id(
        &self,
        kind: EntityKind,
        name: &str,
        scenario: &str,
        explicit: Option<u32>,
        seeds: &[&str],
    ) -> u32 {
        if let Some(id) = explicit {
            return id;
        }
        Lookup::new(&self.repository, self.reference.as_ref())
            .find(&ID_ORDER, kind, &Target::Name(name.to_string()), scenario)
            .map(|(_, found)| found.id)
            .filter(|id| *id != 0)
            .unwrap_or_else(|| self.ids.generate(seeds))
    }

    /// Scenario for a new definition of code set `name`.
    ///
    /// A code set that already has codes is never extended by a second
    /// definition; the new one moves to `<scenario>Dup` (repeated until
    /// free) and an error is recorded.
    pub(super) fn code_set_scenario(&mut self, name: &str, scenario: &str) -> String {
        let target = Target::Name(name.to_string());
        let has_codes = self
            .repository
            .code_set(&target, scenario)
            .is_some_and(|c| !c.codes.is_empty());
        if !has_codes {
            return scenario.to_string();
        }

        let mut candidate = format!("{scenario}{DUP_SUFFIX}");
        while self.repository.code_set(&target, &candidate).is_some() {
            candidate.push_str(DUP_SUFFIX);
        }
        self.diagnostics.error(format!(
            "Duplicate code set {name} (scenario {scenario}); redefined as scenario {candidate}"
        ));
        candidate
    }

    /// Find or create code set `name`, returning the scenario it lives in.
    pub(super) fn ensure_code_set(
        &mut self,
        name: &str,
        scenario: &str,
        explicit_id: Option<u32>,
        type_name: Option<String>,
    ) -> String {
        let scenario = self.code_set_scenario(name, scenario);
        let target = Target::Name(name.to_string());
        if let Some(existing) = self.repository.code_set_mut(&target, &scenario) {
            if type_name.is_some() {
                existing.type_name = type_name;
            }
            return scenario;
        }
        let id = self.assign_id(EntityKind::CodeSet, name, &scenario, explicit_id, &[name]);
        self.repository.add_code_set(CodeSet {
            name: name.to_string(),
            id,
            scenario: scenario.clone(),
            type_name,
            ..CodeSet::default()
        });
        scenario
    }

    fn declare_datatype(&mut self, a: HeadingAttributes) -> EntityRef {
        if self.repository.datatype(&a.name).is_none() {
            self.repository.add_datatype(Datatype {
                name: a.name.clone(),
                base_type: a.type_name,
                ..Datatype::default()
            });
        }
        EntityRef::Datatype(a.name)
    }

    fn declare_code_set(&mut self, a: HeadingAttributes) -> EntityRef {
        let scenario = self.ensure_code_set(&a.name, &a.scenario, a.id, a.type_name);
        EntityRef::CodeSet {
            name: a.name,
            scenario,
        }
    }

    fn declare_component(&mut self, a: HeadingAttributes) -> EntityRef {
        let target = Target::Name(a.name.clone());
        match self.repository.component_mut(&target, &a.scenario) {
            Some(existing) => {
                existing.category = a.category.or(existing.category.take());
                existing.abbr_name = a.abbr_name.or(existing.abbr_name.take());
            }
            None => {
                let id =
                    self.assign_id(EntityKind::Component, &a.name, &a.scenario, a.id, &[&a.name]);
                self.repository.add_component(Component {
                    name: a.name.clone(),
                    id,
                    scenario: a.scenario.clone(),
                    category: a.category,
                    abbr_name: a.abbr_name,
                    ..Component::default()
                });
            }
        }
        EntityRef::Component {
            name: a.name,
            scenario: a.scenario,
        }
    }

    fn declare_group(&mut self, a: HeadingAttributes) -> EntityRef {
        let target = Target::Name(a.name.clone());
        match self.repository.group_mut(&target, &a.scenario) {
            Some(existing) => {
                existing.category = a.category.or(existing.category.take());
                existing.abbr_name = a.abbr_name.or(existing.abbr_name.take());
            }
            None => {
                let id =
                    self.assign_id(EntityKind::Group, &a.name, &a.scenario, a.id, &[&a.name]);
                self.repository.add_group(Group {
                    name: a.name.clone(),
                    id,
                    scenario: a.scenario.clone(),
                    category: a.category,
                    abbr_name: a.abbr_name,
                    ..Group::default()
                });
            }
        }
        EntityRef::Group {
            name: a.name,
            scenario: a.scenario,
        }
    }

    fn declare_message(&mut self, a: HeadingAttributes) -> EntityRef {
        let target = Target::Name(a.name.clone());
        match self.repository.message_mut(&target, &a.scenario) {
            Some(existing) => {
                if let Some(msg_type) = a.type_name {
                    existing.msg_type = msg_type;
                }
                existing.category = a.category.or(existing.category.take());
                existing.abbr_name = a.abbr_name.or(existing.abbr_name.take());
            }
            None => {
                let id =
                    self.assign_id(EntityKind::Message, &a.name, &a.scenario, a.id, &[&a.name]);
                self.repository.add_message(Message {
                    name: a.name.clone(),
                    id,
                    msg_type: a.type_name.unwrap_or_default(),
                    scenario: a.scenario.clone(),
                    category: a.category,
                    abbr_name: a.abbr_name,
                    ..Message::default()
                });
            }
        }
        EntityRef::Message {
            name: a.name,
            scenario: a.scenario,
        }
    }

    fn declare_actor(&mut self, a: HeadingAttributes) -> EntityRef {
        if self.repository.actor_mut(&a.name).is_none() {
            self.repository.add_actor(Actor {
                name: a.name.clone(),
                ..Actor::default()
            });
        }
        EntityRef::Actor(a.name)
    }

    fn declare_flow(&mut self, a: HeadingAttributes) -> EntityRef {
        if self.repository.flow_mut(&a.name).is_none() {
            self.repository.add_flow(Flow {
                name: a.name.clone(),
                ..Flow::default()
            });
        }
        EntityRef::Flow(a.name)
    }

    fn declare_session(&mut self, a: HeadingAttributes) -> EntityRef {
        if self.repository.session_mut(&a.name).is_none() {
            self.repository.add_session(Session {
                name: a.name.clone(),
                ..Session::default()
            });
        }
        EntityRef::Session(a.name)
    }

    fn declare_state_machine(
        &mut self,
        heading: &Context,
        a: HeadingAttributes,
    ) -> Option<EntityRef> {
        let actor = heading
            .ancestors()
            .skip(1)
            .find_map(|ctx| match self.active_at(ctx) {
                Some(EntityRef::Actor(name)) => Some(name.clone()),
                _ => None,
            });
        let Some(actor) = actor else {
            self.diagnostics.error(format!(
                "State machine {} is not declared under an actor",
                a.name
            ));
            return None;
        };

        let owner = self.repository.actor_mut(&actor)?;
        if !owner.state_machines.iter().any(|m| m.name == a.name) {
            owner.state_machines.push(StateMachine {
                name: a.name.clone(),
                ..StateMachine::default()
            });
        }
        Some(EntityRef::StateMachine {
            actor,
            name: a.name,
        })
    }
}
