//! Protocol repository: data model, indexed adapter, lookup chains and YAML I/O.

mod adapter;
mod io;
mod lookup;
mod model;

pub use adapter::{
    CopyDepth, CopyOutcome, CopyRequest, EntityKind, RepositoryAdapter, Resolved, Target,
};
pub use io::{
    generate_yaml, load_repository, load_repository_file, save_yaml, RepositoryWriter, YamlWriter,
};
pub use lookup::{
    Lookup, LookupStrategy, ScenarioChoice, Source, ID_ORDER, IMMEDIATE_ORDER, LOOKUP_ORDER,
    REFERENCE_ORDER,
};
pub use model::*;
