//! Generic document event model.
//!
//! These types describe a nested key/value document without any knowledge
//! of protocol semantics. The event source produces them from Markdown and
//! the repository builder consumes them.

mod context;
mod detail;

use std::rc::Rc;

pub use context::{Ancestors, Context};
pub use detail::{Column, Detail, DetailTable};

/// Prose collected under a heading.
#[derive(Debug, Clone)]
pub struct Documentation {
    context: Rc<Context>,
    text: String,
}

impl Documentation {
    #[must_use]
    pub fn new(context: Rc<Context>, text: impl Into<String>) -> Self {
        Self {
            context,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One event of the stream emitted by the event source.
#[derive(Debug, Clone)]
pub enum DocumentEvent {
    /// A heading was read; the context is now current at its level.
    Heading(Rc<Context>),
    /// Prose belonging to a heading.
    Documentation(Documentation),
    /// Flat properties (emitted for single-row tables).
    Detail(Detail),
    /// A table of properties.
    DetailTable(DetailTable),
}

impl DocumentEvent {
    /// Context that owns this event.
    #[must_use]
    pub fn context(&self) -> &Rc<Context> {
        match self {
            Self::Heading(context) => context,
            Self::Documentation(doc) => doc.context(),
            Self::Detail(detail) => detail.context(),
            Self::DetailTable(table) => table.context(),
        }
    }
}

/// Receiver of document events, in document order.
pub trait DocumentConsumer {
    fn consume(&mut self, event: DocumentEvent);
}

impl DocumentConsumer for Vec<DocumentEvent> {
    fn consume(&mut self, event: DocumentEvent) {
        self.push(event);
    }
}
