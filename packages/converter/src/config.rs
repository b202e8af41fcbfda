//! Configuration constants and builder settings.

use std::sync::LazyLock;

use regex::Regex;

use crate::builder::{ColumnKey, KeyTable};
use crate::error::{ConverterError, Result};
use crate::repository::CopyDepth;

/// Scenario of entities that do not name one.
pub const DEFAULT_SCENARIO: &str = "base";

/// Appended to the scenario of a duplicate code set definition.
pub const DUP_SUFFIX: &str = "Dup";

/// Lower bound (inclusive) of generated ids.
pub const DEFAULT_ID_MIN: u32 = 5000;

/// Upper bound (exclusive) of generated ids.
pub const DEFAULT_ID_MAX: u32 = 40000;

/// Explicit id in a heading, e.g. `Component Parties (1012)`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
pub static HEADING_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\((\d+)\)$").expect("valid regex"));

/// Extract the id from a `(N)` heading token.
///
/// # Examples
/// ```
/// use mdorchestra_converter::config::heading_id;
///
/// assert_eq!(heading_id("(1012)"), Some(1012));
/// assert_eq!(heading_id("1012"), None);
/// ```
#[must_use]
pub fn heading_id(token: &str) -> Option<u32> {
    HEADING_ID_PATTERN
        .captures(token)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Settings for one conversion.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub id_min: u32,
    pub id_max: u32,
    /// Levels of members copied along with an entity from the reference.
    pub copy_depth: CopyDepth,
    pub keys: KeyTable,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            id_min: DEFAULT_ID_MIN,
            id_max: DEFAULT_ID_MAX,
            copy_depth: CopyDepth::default(),
            keys: KeyTable::default(),
        }
    }
}

impl BuilderConfig {
    #[must_use]
    pub fn with_id_range(mut self, min: u32, max: u32) -> Self {
        self.id_min = min;
        self.id_max = max;
        self
    }

    #[must_use]
    pub fn with_copy_depth(mut self, depth: CopyDepth) -> Self {
        self.copy_depth = depth;
        self
    }

    #[must_use]
    pub fn with_alias(mut self, heading: &str, key: ColumnKey) -> Self {
        self.keys = self.keys.with_alias(heading, key);
        self
    }

    /// Check settings that cannot be enforced by types.
    pub fn validate(&self) -> Result<()> {
        if self.id_min >= self.id_max {
            return Err(ConverterError::InvalidIdRange {
                min: self.id_min,
                max: self.id_max,
            });
        }
        Ok(())
    }
}
