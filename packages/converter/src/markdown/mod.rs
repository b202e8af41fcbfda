//! Markdown input: parser front end and event source.
//!
//! [`parse`] turns raw text into a [`MarkdownTree`]; [`emit_events`] walks the
//! tree and feeds [`crate::document::DocumentEvent`]s to a consumer.

mod listener;
mod parser;
mod tree;

pub use listener::{emit_events, trim_cell, EventSource};
pub use parser::parse;
pub use tree::{MarkdownTree, Node, NodeKind};
