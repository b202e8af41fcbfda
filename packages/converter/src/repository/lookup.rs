//! Ordered fallback between the working and reference models.

use super::adapter::{EntityKind, RepositoryAdapter, Resolved, Target};
use crate::config::DEFAULT_SCENARIO;

/// Which model a strategy consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Working,
    Reference,
}

/// Which scenario a strategy consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioChoice {
    Requested,
    Default,
}

/// One step of a lookup chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupStrategy {
    pub source: Source,
    pub scenario: ScenarioChoice,
}

impl LookupStrategy {
    #[must_use]
    pub const fn new(source: Source, scenario: ScenarioChoice) -> Self {
        Self { source, scenario }
    }
}

/// Full chain used when resolving references after the document is read.
pub const LOOKUP_ORDER: [LookupStrategy; 4] = [
    LookupStrategy::new(Source::Working, ScenarioChoice::Requested),
    LookupStrategy::new(Source::Working, ScenarioChoice::Default),
    LookupStrategy::new(Source::Reference, ScenarioChoice::Requested),
    LookupStrategy::new(Source::Reference, ScenarioChoice::Default),
];

/// Chain used while events are still arriving.
pub const IMMEDIATE_ORDER: [LookupStrategy; 1] =
    [LookupStrategy::new(Source::Working, ScenarioChoice::Requested)];

/// Chain for the id of a newly declared entity, after its own scenario was
/// found missing from the working model.
pub const ID_ORDER: [LookupStrategy; 3] = [
    LookupStrategy::new(Source::Working, ScenarioChoice::Default),
    LookupStrategy::new(Source::Reference, ScenarioChoice::Requested),
    LookupStrategy::new(Source::Reference, ScenarioChoice::Default),
];

/// Chain for entities that must come from the reference model.
pub const REFERENCE_ORDER: [LookupStrategy; 2] = [
    LookupStrategy::new(Source::Reference, ScenarioChoice::Requested),
    LookupStrategy::new(Source::Reference, ScenarioChoice::Default),
];

/// A pair of models searched by strategy.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    working: &'a RepositoryAdapter,
    reference: Option<&'a RepositoryAdapter>,
}

impl<'a> Lookup<'a> {
    #[must_use]
    pub fn new(working: &'a RepositoryAdapter, reference: Option<&'a RepositoryAdapter>) -> Self {
        Self { working, reference }
    }

    /// Run `probe` for each strategy in `order` and return the first hit.
    ///
    /// A default-scenario step is skipped when the requested scenario is
    /// already the default, and reference steps are skipped without a
    /// reference model.
    pub fn first<T>(
        &self,
        order: &[LookupStrategy],
        scenario: &str,
        mut probe: impl FnMut(&'a RepositoryAdapter, &str) -> Option<T>,
    ) -> Option<(LookupStrategy, T)> {
        order.iter().find_map(|strategy| {
            let adapter = match strategy.source {
                Source::Working => self.working,
                Source::Reference => self.reference?,
            };
            let scenario = match strategy.scenario {
                ScenarioChoice::Requested => scenario,
                ScenarioChoice::Default if scenario == DEFAULT_SCENARIO => return None,
                ScenarioChoice::Default => DEFAULT_SCENARIO,
            };
            probe(adapter, scenario).map(|found| (*strategy, found))
        })
    }

    /// Find an entity of `kind` following `order`.
    #[must_use]
    pub fn find(
        &self,
        order: &[LookupStrategy],
        kind: EntityKind,
        target: &Target,
        scenario: &str,
    ) -> Option<(LookupStrategy, Resolved)> {
        self.first(order, scenario, |adapter, scenario| {
            adapter.resolve(kind, target, scenario)
        })
    }
}
