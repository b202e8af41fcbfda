//! Indexed access to a [`Repository`] and copying from a reference model.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::model::{
    Actor, Annotation, Category, CodeSet, Component, Datatype, Field, Flow, Group, Member,
    Message, MetadataTerm, Repository, Section, Session,
};
use crate::error::ConverterError;

/// Kind of entity addressed by lookups and copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Field,
    Component,
    Group,
    Message,
    CodeSet,
    Datatype,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Field => "field",
            Self::Component => "component",
            Self::Group => "group",
            Self::Message => "message",
            Self::CodeSet => "code set",
            Self::Datatype => "datatype",
        };
        f.write_str(name)
    }
}

/// How an entity is addressed: by name or by numeric id (tag).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    Name(String),
    Id(u32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "id {id}"),
        }
    }
}

/// Identity of an entity found by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub name: String,
    pub id: u32,
    pub scenario: String,
}

/// Limit on how many levels of members are copied with an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyDepth {
    Limited(u32),
    Unbounded,
}

impl Default for CopyDepth {
    fn default() -> Self {
        Self::Limited(1)
    }
}

impl CopyDepth {
    /// Depth for members one level down.
    #[must_use]
    pub fn descend(self) -> Self {
        match self {
            Self::Limited(n) => Self::Limited(n.saturating_sub(1)),
            Self::Unbounded => Self::Unbounded,
        }
    }

    /// Whether members of a copied entity are copied too.
    #[must_use]
    pub fn allows_members(self) -> bool {
        match self {
            Self::Limited(n) => n > 0,
            Self::Unbounded => true,
        }
    }
}

impl FromStr for CopyDepth {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Unbounded);
        }
        s.parse::<u32>()
            .map(Self::Limited)
            .map_err(|_| ConverterError::InvalidDepth(s.to_string()))
    }
}

impl fmt::Display for CopyDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// A nested entity that should be copied after its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub kind: EntityKind,
    pub target: Target,
    pub scenario: String,
    pub depth: CopyDepth,
}

/// Result of [`RepositoryAdapter::copy_member`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    /// The entity as it now exists in the working model.
    pub resolved: Resolved,
    /// Dependencies still missing from the working model.
    pub nested: Vec<CopyRequest>,
}

/// Entities addressed by (name, scenario) and (id, scenario).
trait Keyed {
    fn name(&self) -> &str;
    fn id(&self) -> u32;
    fn scenario(&self) -> &str;

    fn resolved(&self) -> Resolved {
        Resolved {
            name: self.name().to_string(),
            id: self.id(),
            scenario: self.scenario().to_string(),
        }
    }
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn id(&self) -> u32 {
                self.id
            }
            fn scenario(&self) -> &str {
                &self.scenario
            }
        })*
    };
}

impl_keyed!(Field, Component, Group, Message, CodeSet);

/// Positions of keyed entities in their vector. The first definition of a
/// key wins; id 0 marks an unknown id and is never indexed.
#[derive(Debug, Clone, Default)]
struct KeyIndex {
    by_name: HashMap<(String, String), usize>,
    by_id: HashMap<(u32, String), usize>,
}

impl KeyIndex {
    fn build<T: Keyed>(items: &[T]) -> Self {
        let mut index = Self::default();
        for (position, item) in items.iter().enumerate() {
            index.insert(item, position);
        }
        index
    }

    fn insert<T: Keyed>(&mut self, item: &T, position: usize) {
        self.by_name
            .entry((item.name().to_string(), item.scenario().to_string()))
            .or_insert(position);
        if item.id() != 0 {
            self.by_id
                .entry((item.id(), item.scenario().to_string()))
                .or_insert(position);
        }
    }

    fn position(&self, target: &Target, scenario: &str) -> Option<usize> {
        match target {
            Target::Name(name) => self
                .by_name
                .get(&(name.clone(), scenario.to_string()))
                .copied(),
            Target::Id(0) => None,
            Target::Id(id) => self.by_id.get(&(*id, scenario.to_string())).copied(),
        }
    }
}

/// Owner of one repository with lookup indexes.
///
/// Used both for the model under construction and, read-only, for the
/// reference model.
#[derive(Debug, Clone, Default)]
pub struct RepositoryAdapter {
    repository: Repository,
    fields: KeyIndex,
    components: KeyIndex,
    groups: KeyIndex,
    messages: KeyIndex,
    code_sets: KeyIndex,
}

macro_rules! keyed_access {
    ($get:ident, $get_mut:ident, $add:ident, $ty:ty, $items:ident, $index:ident) => {
        #[must_use]
        pub fn $get(&self, target: &Target, scenario: &str) -> Option<&$ty> {
            self.$index
                .position(target, scenario)
                .and_then(|i| self.repository.$items.get(i))
        }

        pub fn $get_mut(&mut self, target: &Target, scenario: &str) -> Option<&mut $ty> {
            self.$index
                .position(target, scenario)
                .and_then(|i| self.repository.$items.get_mut(i))
        }

        /// Append an entity. Its name, id and scenario must be final.
        pub fn $add(&mut self, entity: $ty) -> &mut $ty {
            let position = self.repository.$items.len();
            self.$index.insert(&entity, position);
            self.repository.$items.push(entity);
            &mut self.repository.$items[position]
        }
    };
}

impl RepositoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a loaded repository and build its indexes.
    #[must_use]
    pub fn from_repository(repository: Repository) -> Self {
        Self {
            fields: KeyIndex::build(&repository.fields),
            components: KeyIndex::build(&repository.components),
            groups: KeyIndex::build(&repository.groups),
            messages: KeyIndex::build(&repository.messages),
            code_sets: KeyIndex::build(&repository.code_sets),
            repository,
        }
    }

    #[must_use]
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    #[must_use]
    pub fn into_repository(self) -> Repository {
        self.repository
    }

    keyed_access!(field, field_mut, add_field, Field, fields, fields);
    keyed_access!(component, component_mut, add_component, Component, components, components);
    keyed_access!(group, group_mut, add_group, Group, groups, groups);
    keyed_access!(message, message_mut, add_message, Message, messages, messages);
    keyed_access!(code_set, code_set_mut, add_code_set, CodeSet, code_sets, code_sets);

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.repository.name = name.into();
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.repository.version = version.into();
    }

    pub fn add_metadata_term(&mut self, term: impl Into<String>, value: impl Into<String>) {
        self.repository.metadata.push(MetadataTerm {
            term: term.into(),
            value: value.into(),
        });
    }

    pub fn annotation_mut(&mut self) -> &mut Annotation {
        &mut self.repository.annotation
    }

    #[must_use]
    pub fn datatype(&self, name: &str) -> Option<&Datatype> {
        self.repository.datatypes.iter().find(|d| d.name == name)
    }

    pub fn datatype_mut(&mut self, name: &str) -> Option<&mut Datatype> {
        self.repository.datatypes.iter_mut().find(|d| d.name == name)
    }

    pub fn add_datatype(&mut self, datatype: Datatype) -> &mut Datatype {
        let position = self.repository.datatypes.len();
        self.repository.datatypes.push(datatype);
        &mut self.repository.datatypes[position]
    }

    pub fn actor_mut(&mut self, name: &str) -> Option<&mut Actor> {
        self.repository.actors.iter_mut().find(|a| a.name == name)
    }

    pub fn add_actor(&mut self, actor: Actor) -> &mut Actor {
        let position = self.repository.actors.len();
        self.repository.actors.push(actor);
        &mut self.repository.actors[position]
    }

    pub fn flow_mut(&mut self, name: &str) -> Option<&mut Flow> {
        self.repository.flows.iter_mut().find(|f| f.name == name)
    }

    pub fn add_flow(&mut self, flow: Flow) -> &mut Flow {
        let position = self.repository.flows.len();
        self.repository.flows.push(flow);
        &mut self.repository.flows[position]
    }

    pub fn session_mut(&mut self, name: &str) -> Option<&mut Session> {
        self.repository.sessions.iter_mut().find(|s| s.name == name)
    }

    pub fn add_session(&mut self, session: Session) -> &mut Session {
        let position = self.repository.sessions.len();
        self.repository.sessions.push(session);
        &mut self.repository.sessions[position]
    }

    pub fn add_category(&mut self, category: Category) {
        self.repository.categories.push(category);
    }

    pub fn add_section(&mut self, section: Section) {
        self.repository.sections.push(section);
    }

    /// Find an entity of `kind` in exactly `scenario`.
    ///
    /// Datatypes have no id or scenario and match by name only.
    #[must_use]
    pub fn resolve(&self, kind: EntityKind, target: &Target, scenario: &str) -> Option<Resolved> {
        match kind {
            EntityKind::Field => self.field(target, scenario).map(Keyed::resolved),
            EntityKind::Component => self.component(target, scenario).map(Keyed::resolved),
            EntityKind::Group => self.group(target, scenario).map(Keyed::resolved),
            EntityKind::Message => self.message(target, scenario).map(Keyed::resolved),
            EntityKind::CodeSet => self.code_set(target, scenario).map(Keyed::resolved),
            EntityKind::Datatype => match target {
                Target::Name(name) => self.datatype(name).map(|d| Resolved {
                    name: d.name.clone(),
                    id: 0,
                    scenario: scenario.to_string(),
                }),
                Target::Id(_) => None,
            },
        }
    }

    /// Copy one entity from `source` into this adapter.
    ///
    /// Returns `None` when `source` has no such entity. When the working
    /// model already holds the same (name, scenario) nothing is copied and
    /// the existing entity is reported. Dependencies not yet present here
    /// are returned as [`CopyRequest`]s: a field's code set or datatype and
    /// a group's NumInGroup field always, members only when `depth` allows.
    pub fn copy_member(
        &mut self,
        source: &RepositoryAdapter,
        kind: EntityKind,
        target: &Target,
        scenario: &str,
        depth: CopyDepth,
    ) -> Option<CopyOutcome> {
        let found = source.resolve(kind, target, scenario)?;
        let by_name = Target::Name(found.name.clone());
        if let Some(existing) = self.resolve(kind, &by_name, &found.scenario) {
            return Some(CopyOutcome {
                resolved: existing,
                nested: Vec::new(),
            });
        }

        let nested_depth = depth.descend();
        let mut nested = Vec::new();
        match kind {
            EntityKind::Field => {
                let field = source.field(&by_name, &found.scenario)?.clone();
                if let Some(request) = self.type_request(source, &field, nested_depth) {
                    nested.push(request);
                }
                self.add_field(field);
            }
            EntityKind::Component => {
                let component = source.component(&by_name, &found.scenario)?.clone();
                if depth.allows_members() {
                    nested.extend(self.member_requests(&component.members, nested_depth));
                }
                self.add_component(component);
            }
            EntityKind::Group => {
                let group = source.group(&by_name, &found.scenario)?.clone();
                if let Some(counter) = &group.num_in_group {
                    let counter_target = Target::Id(counter.id);
                    if self
                        .resolve(EntityKind::Field, &counter_target, &counter.scenario)
                        .is_none()
                    {
                        nested.push(CopyRequest {
                            kind: EntityKind::Field,
                            target: counter_target,
                            scenario: counter.scenario.clone(),
                            depth: nested_depth,
                        });
                    }
                }
                if depth.allows_members() {
                    nested.extend(self.member_requests(&group.members, nested_depth));
                }
                self.add_group(group);
            }
            EntityKind::Message => {
                let message = source.message(&by_name, &found.scenario)?.clone();
                if depth.allows_members() {
                    nested.extend(self.member_requests(&message.members, nested_depth));
                }
                self.add_message(message);
            }
            EntityKind::CodeSet => {
                let code_set = source.code_set(&by_name, &found.scenario)?.clone();
                self.add_code_set(code_set);
            }
            EntityKind::Datatype => {
                let datatype = source.datatype(&found.name)?.clone();
                self.add_datatype(datatype);
            }
        }

        tracing::debug!(
            kind = %kind,
            name = %found.name,
            scenario = %found.scenario,
            "Copied from reference"
        );
        Some(CopyOutcome {
            resolved: found,
            nested,
        })
    }

    fn type_request(
        &self,
        source: &RepositoryAdapter,
        field: &Field,
        depth: CopyDepth,
    ) -> Option<CopyRequest> {
        let type_name = field.type_name.as_deref()?;
        let target = Target::Name(type_name.to_string());
        if source.code_set(&target, &field.scenario).is_some() {
            if self.code_set(&target, &field.scenario).is_some() {
                return None;
            }
            return Some(CopyRequest {
                kind: EntityKind::CodeSet,
                target,
                scenario: field.scenario.clone(),
                depth,
            });
        }
        if source.datatype(type_name).is_some() && self.datatype(type_name).is_none() {
            return Some(CopyRequest {
                kind: EntityKind::Datatype,
                target,
                scenario: field.scenario.clone(),
                depth,
            });
        }
        None
    }

    fn member_requests(&self, members: &[Member], depth: CopyDepth) -> Vec<CopyRequest> {
        members
            .iter()
            .filter(|m| m.id() != 0)
            .filter_map(|member| {
                let kind = match member {
                    Member::Field(_) => EntityKind::Field,
                    Member::Component(_) => EntityKind::Component,
                    Member::Group(_) => EntityKind::Group,
                };
                let target = Target::Id(member.id());
                let scenario = member.scenario().to_string();
                if self.resolve(kind, &target, &scenario).is_some() {
                    return None;
                }
                Some(CopyRequest {
                    kind,
                    target,
                    scenario,
                    depth,
                })
            })
            .collect()
    }
}
