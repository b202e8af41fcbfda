//! Protocol repository data model.
//!
//! Field order in each struct is the serialized order. Empty collections and
//! absent optionals are omitted from the YAML output.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SCENARIO;

fn default_scenario() -> String {
    DEFAULT_SCENARIO.to_string()
}

/// A complete protocol repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Repository {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetadataTerm>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub datatypes: Vec<Datatype>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub code_sets: Vec<CodeSet>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<Actor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<Flow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<Session>,
}

/// A named metadata term such as `title` or `publisher`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTerm {
    pub term: String,
    pub value: String,
}

/// One documentation paragraph with an optional purpose, e.g. `elaboration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub text: String,
}

/// Ordered documentation attached to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotation(pub Vec<DocumentationEntry>);

impl Annotation {
    pub fn push(&mut self, purpose: Option<String>, text: impl Into<String>) {
        self.0.push(DocumentationEntry {
            purpose,
            text: text.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentationEntry> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<u32>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

/// A datatype with optional mappings to external standards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Datatype {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<MappedDatatype>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

/// Mapping of a datatype onto a type of another standard, e.g. XML Schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappedDatatype {
    pub standard: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_inclusive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_inclusive: Option<String>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

/// An enumeration of valid values for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeSet {
    pub name: String,
    pub id: u32,
    pub scenario: String,
    /// Datatype of the code values.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub codes: Vec<Code>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for CodeSet {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            scenario: default_scenario(),
            type_name: None,
            codes: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Code {
    pub name: String,
    pub id: u32,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Field {
    pub name: String,
    pub id: u32,
    pub scenario: String,
    /// Datatype or code set name.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator_id: Option<u32>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            scenario: default_scenario(),
            type_name: None,
            category: None,
            abbr_name: None,
            discriminator_id: None,
            annotation: Annotation::default(),
        }
    }
}

/// A reusable block of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    pub name: String,
    pub id: u32,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for Component {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            scenario: default_scenario(),
            category: None,
            abbr_name: None,
            members: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

/// A repeating group, counted by its NumInGroup field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    pub name: String,
    pub id: u32,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_in_group: Option<FieldRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            scenario: default_scenario(),
            category: None,
            abbr_name: None,
            num_in_group: None,
            members: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub name: String,
    pub id: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub msg_type: String,
    pub scenario: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr_name: Option<String>,
    #[serde(rename = "structure", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Response>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: 0,
            msg_type: String::new(),
            scenario: default_scenario(),
            category: None,
            abbr_name: None,
            members: Vec::new(),
            responses: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

/// A member of a component, group, message or actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Member {
    Field(FieldRef),
    Component(ComponentRef),
    Group(GroupRef),
}

impl Member {
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Self::Field(r) => r.id,
            Self::Component(r) => r.id,
            Self::Group(r) => r.id,
        }
    }

    #[must_use]
    pub fn scenario(&self) -> &str {
        match self {
            Self::Field(r) => &r.scenario,
            Self::Component(r) => &r.scenario,
            Self::Group(r) => &r.scenario,
        }
    }

    /// Point the reference at a resolved entity.
    pub fn set_key(&mut self, id: u32, scenario: &str) {
        let (slot_id, slot_scenario) = match self {
            Self::Field(r) => (&mut r.id, &mut r.scenario),
            Self::Component(r) => (&mut r.id, &mut r.scenario),
            Self::Group(r) => (&mut r.id, &mut r.scenario),
        };
        *slot_id = id;
        scenario.clone_into(slot_scenario);
    }
}

/// Whether a member must appear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Required,
    #[default]
    Optional,
    Forbidden,
    Constant,
    Ignored,
}

impl Presence {
    /// Parse a presence keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_lowercase().as_str() {
            "required" => Some(Self::Required),
            "optional" => Some(Self::Optional),
            "forbidden" => Some(Self::Forbidden),
            "constant" => Some(Self::Constant),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::Optional
    }
}

/// Presence that applies when an expression holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRule {
    pub presence: Presence,
    pub when: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRef {
    pub id: u32,
    pub scenario: String,
    #[serde(skip_serializing_if = "Presence::is_default")]
    pub presence: Presence,
    /// Fixed value of a constant field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PresenceRule>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for FieldRef {
    fn default() -> Self {
        Self {
            id: 0,
            scenario: default_scenario(),
            presence: Presence::default(),
            value: None,
            assign: None,
            rules: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentRef {
    pub id: u32,
    pub scenario: String,
    #[serde(skip_serializing_if = "Presence::is_default")]
    pub presence: Presence,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PresenceRule>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for ComponentRef {
    fn default() -> Self {
        Self {
            id: 0,
            scenario: default_scenario(),
            presence: Presence::default(),
            rules: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupRef {
    pub id: u32,
    pub scenario: String,
    #[serde(skip_serializing_if = "Presence::is_default")]
    pub presence: Presence,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PresenceRule>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl Default for GroupRef {
    fn default() -> Self {
        Self {
            id: 0,
            scenario: default_scenario(),
            presence: Presence::default(),
            rules: Vec::new(),
            annotation: Annotation::default(),
        }
    }
}

/// A message sent in reply to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    pub message_ref: MessageRef,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageRef {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub msg_type: String,
    pub scenario: String,
}

impl Default for MessageRef {
    fn default() -> Self {
        Self {
            name: String::new(),
            msg_type: String::new(),
            scenario: default_scenario(),
        }
    }
}

/// A protocol participant with its variables and state machines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Actor {
    pub name: String,
    #[serde(rename = "variables", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub state_machines: Vec<StateMachine>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateMachine {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<State>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<State>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

impl StateMachine {
    /// Look up a state by name, including the initial state.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.initial
            .iter()
            .chain(self.states.iter())
            .find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct State {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transition {
    pub name: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

/// A directed message exchange between two actors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reliability: Option<String>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

/// Session layer settings identified by name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<Identifier>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identifier {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Annotation::is_empty")]
    pub annotation: Annotation,
}
