//! Section keywords and locating the section that owns an event.

use crate::document::Context;

/// Recognized leading heading keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Datatype,
    CodeSet,
    Component,
    Group,
    Field,
    Message,
    Actor,
    Flow,
    Categories,
    Sections,
    StateMachine,
    Variables,
    Responses,
    Identifiers,
    Session,
}

impl SectionKind {
    /// Map a heading keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword.to_lowercase().as_str() {
            "datatype" | "datatypes" => Self::Datatype,
            "codeset" | "codesets" => Self::CodeSet,
            "component" => Self::Component,
            "group" => Self::Group,
            "field" | "fields" => Self::Field,
            "message" => Self::Message,
            "actor" => Self::Actor,
            "flow" => Self::Flow,
            "categories" => Self::Categories,
            "sections" => Self::Sections,
            "statemachine" => Self::StateMachine,
            "variables" => Self::Variables,
            "responses" => Self::Responses,
            "identifiers" => Self::Identifiers,
            "session" => Self::Session,
            _ => return None,
        };
        Some(kind)
    }
}

/// Where an event belongs.
#[derive(Debug, Clone, Copy)]
pub enum Located<'a> {
    /// Nearest context (the event's own or an ancestor) with a section keyword.
    Section {
        kind: SectionKind,
        context: &'a Context,
    },
    /// Document level: repository metadata.
    Root,
    /// Below a heading whose keyword is not recognized; carries the
    /// outermost non-root heading of the chain.
    Unknown(&'a Context),
}

/// Find the section that owns an event with `context`.
#[must_use]
pub fn locate(context: &Context) -> Located<'_> {
    for ancestor in context.ancestors() {
        if let Some(kind) = ancestor.key(0).and_then(SectionKind::from_keyword) {
            return Located::Section {
                kind,
                context: ancestor,
            };
        }
    }
    if context.level() <= 1 {
        return Located::Root;
    }
    let outermost = context
        .ancestors()
        .take_while(|c| c.level() > 1)
        .last()
        .unwrap_or(context);
    Located::Unknown(outermost)
}
