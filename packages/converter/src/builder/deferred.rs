//! Resolutions postponed until the whole document has been read.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::repository::{CopyRequest, EntityKind, Target};

/// Entity whose member list holds a pending reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberOwner {
    Component { name: String, scenario: String },
    Group { name: String, scenario: String },
    Message { name: String, scenario: String },
    Actor { name: String },
}

impl fmt::Display for MemberOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component { name, scenario } => write!(f, "component {name} ({scenario})"),
            Self::Group { name, scenario } => write!(f, "group {name} ({scenario})"),
            Self::Message { name, scenario } => write!(f, "message {name} ({scenario})"),
            Self::Actor { name } => write!(f, "actor {name}"),
        }
    }
}

/// Place of a reference within its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotPosition {
    Member(usize),
    NumInGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSlot {
    pub owner: MemberOwner,
    pub position: SlotPosition,
}

/// One queued retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingStep {
    ResolveFieldRef {
        slot: MemberSlot,
        target: Target,
        scenario: String,
    },
    ResolveComponentRef {
        slot: MemberSlot,
        target: Target,
        scenario: String,
    },
    ResolveGroupRef {
        slot: MemberSlot,
        target: Target,
        scenario: String,
    },
    /// Fill in the message type of a response's message reference.
    ResolveResponse {
        message: String,
        message_scenario: String,
        index: usize,
        target: String,
        scenario: String,
    },
    /// Copy a field's datatype or code set from the reference model.
    ResolveFieldType {
        field: String,
        scenario: String,
        type_name: String,
    },
    /// Copy a dependency of an entity copied earlier.
    CopyMember(CopyRequest),
}

/// Identity used to enqueue each step at most once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum StepKey {
    Slot(MemberSlot),
    Response(String, String, usize),
    FieldType(String, String),
    Copy(EntityKind, Target, String),
}

impl PendingStep {
    fn key(&self) -> StepKey {
        match self {
            Self::ResolveFieldRef { slot, .. }
            | Self::ResolveComponentRef { slot, .. }
            | Self::ResolveGroupRef { slot, .. } => StepKey::Slot(slot.clone()),
            Self::ResolveResponse {
                message,
                message_scenario,
                index,
                ..
            } => StepKey::Response(message.clone(), message_scenario.clone(), *index),
            Self::ResolveFieldType {
                field, scenario, ..
            } => StepKey::FieldType(field.clone(), scenario.clone()),
            Self::CopyMember(request) => StepKey::Copy(
                request.kind,
                request.target.clone(),
                request.scenario.clone(),
            ),
        }
    }
}

/// FIFO of pending steps; a step with the same identity is accepted once.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    steps: VecDeque<PendingStep>,
    seen: HashSet<StepKey>,
}

impl DeferredQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Returns `false` when an equal step was queued before,
    /// even if it has already run.
    pub fn push(&mut self, step: PendingStep) -> bool {
        if !self.seen.insert(step.key()) {
            return false;
        }
        self.steps.push_back(step);
        true
    }

    pub fn pop(&mut self) -> Option<PendingStep> {
        self.steps.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingStep> {
        self.steps.iter()
    }
}
