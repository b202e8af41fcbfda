//! mdorchestra converter - Build protocol repositories from Markdown.
//!
//! A protocol specification is written as Markdown: headings declare
//! datatypes, code sets, fields, components, groups, messages, actors and
//! flows, and tables list their members. This crate reads such a document
//! and builds a cross-referenced repository, filling gaps from an optional
//! reference repository.
//!
//! # Example
//!
//! ```
//! use mdorchestra_converter::{convert_markdown, BuilderConfig};
//!
//! let markdown = "\
//! ## Message Heartbeat type 0
//!
//! | Name | Tag | Presence |
//! |---|---|---|
//! | TestReqID | 112 | optional |
//!
//! ## Fields
//!
//! | Name | Tag | Type |
//! |---|---|---|
//! | TestReqID | 112 | String |
//! ";
//! let output = convert_markdown(markdown, BuilderConfig::default(), None).unwrap();
//! assert_eq!(output.repository.messages[0].members[0].id(), 112);
//! assert_eq!(output.diagnostics.error_count(), 0);
//! ```
//!
//! # Architecture
//!
//! - [`markdown`]: Markdown front end and the event source walking its tree
//! - [`document`]: Document events (heading, documentation, detail, table)
//! - [`builder`]: Repository builder consuming events, with deferred resolution
//! - [`repository`]: Data model, indexed adapter, lookup chains and YAML I/O
//! - [`idgen`]: Deterministic id generation
//! - [`diagnostics`]: Recoverable problems found during a conversion
//! - [`config`]: Configuration constants and builder settings
//! - [`error`]: Error types and Result alias
//! - [`convert`]: One-call conversion
//! - [`cli`]: Command-line interface

pub mod builder;
pub mod cli;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod idgen;
pub mod markdown;
pub mod repository;

// Re-export main functions
pub use convert::{convert_file, convert_markdown};

// Re-export commonly used items
pub use builder::{BuildOutput, RepositoryBuilder};
pub use config::BuilderConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ConverterError, Result};
pub use repository::{Repository, RepositoryAdapter};
