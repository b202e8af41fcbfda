//! Table column headings and the canonical keys they map to.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::document::Detail;
use crate::error::{ConverterError, Result};

/// Canonical meaning of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Name,
    Tag,
    Type,
    Presence,
    Values,
    Value,
    Documentation,
    Scenario,
    Category,
    AbbrName,
    Discriminator,
    Sort,
    Standard,
    Base,
    Builtin,
    Element,
    Parameter,
    MinInclusive,
    MaxInclusive,
    State,
    Transition,
    Target,
    When,
    Source,
    Destination,
    Reliability,
    Section,
    Kind,
    DisplayOrder,
    Term,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 30] = [
        Self::Name,
        Self::Tag,
        Self::Type,
        Self::Presence,
        Self::Values,
        Self::Value,
        Self::Documentation,
        Self::Scenario,
        Self::Category,
        Self::AbbrName,
        Self::Discriminator,
        Self::Sort,
        Self::Standard,
        Self::Base,
        Self::Builtin,
        Self::Element,
        Self::Parameter,
        Self::MinInclusive,
        Self::MaxInclusive,
        Self::State,
        Self::Transition,
        Self::Target,
        Self::When,
        Self::Source,
        Self::Destination,
        Self::Reliability,
        Self::Section,
        Self::Kind,
        Self::DisplayOrder,
        Self::Term,
    ];

    /// Name used in alias definitions, e.g. `abbrName`.
    #[must_use]
    pub fn canonical(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Tag => "tag",
            Self::Type => "type",
            Self::Presence => "presence",
            Self::Values => "values",
            Self::Value => "value",
            Self::Documentation => "documentation",
            Self::Scenario => "scenario",
            Self::Category => "category",
            Self::AbbrName => "abbrName",
            Self::Discriminator => "discriminator",
            Self::Sort => "sort",
            Self::Standard => "standard",
            Self::Base => "base",
            Self::Builtin => "builtin",
            Self::Element => "element",
            Self::Parameter => "parameter",
            Self::MinInclusive => "minInclusive",
            Self::MaxInclusive => "maxInclusive",
            Self::State => "state",
            Self::Transition => "on",
            Self::Target => "target",
            Self::When => "when",
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Reliability => "reliability",
            Self::Section => "section",
            Self::Kind => "kind",
            Self::DisplayOrder => "displayOrder",
            Self::Term => "term",
        }
    }

    /// Heading written for this key in generated tables.
    #[must_use]
    pub fn default_heading(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Tag => "Tag",
            Self::Type => "Type",
            Self::Presence => "Presence",
            Self::Values => "Values",
            Self::Value => "Value",
            Self::Documentation => "Documentation",
            Self::Scenario => "Scenario",
            Self::Category => "Category",
            Self::AbbrName => "AbbrName",
            Self::Discriminator => "Discriminator",
            Self::Sort => "Sort",
            Self::Standard => "Standard",
            Self::Base => "Base",
            Self::Builtin => "Builtin",
            Self::Element => "Element",
            Self::Parameter => "Parameter",
            Self::MinInclusive => "MinInclusive",
            Self::MaxInclusive => "MaxInclusive",
            Self::State => "State",
            Self::Transition => "On",
            Self::Target => "Target",
            Self::When => "When",
            Self::Source => "Source",
            Self::Destination => "Destination",
            Self::Reliability => "Reliability",
            Self::Section => "Section",
            Self::Kind => "Kind",
            Self::DisplayOrder => "DisplayOrder",
            Self::Term => "Term",
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for ColumnKey {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|k| normalize(k.canonical()) == wanted)
            .ok_or_else(|| ConverterError::UnknownColumnKey(s.to_string()))
    }
}

/// Built-in alternative headings.
const BUILTIN_ALIASES: &[(&str, ColumnKey)] = &[
    ("id", ColumnKey::Tag),
    ("description", ColumnKey::Documentation),
    ("abbreviation", ColumnKey::AbbrName),
    ("event", ColumnKey::Transition),
    ("transition", ColumnKey::Transition),
    ("code", ColumnKey::Value),
    ("datatype", ColumnKey::Type),
];

fn normalize(heading: &str) -> String {
    heading
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case-insensitive association between column headings and [`ColumnKey`]s.
///
/// Every key is reachable through its canonical name and its default
/// heading. Aliases add further headings; an alias may shadow a built-in.
#[derive(Debug, Clone)]
pub struct KeyTable {
    keys: HashMap<String, ColumnKey>,
    headings: HashMap<ColumnKey, String>,
}

impl Default for KeyTable {
    fn default() -> Self {
        let mut keys = HashMap::new();
        for key in ColumnKey::ALL {
            keys.insert(normalize(key.canonical()), key);
            keys.insert(normalize(key.default_heading()), key);
        }
        for (heading, key) in BUILTIN_ALIASES {
            keys.insert(normalize(heading), *key);
        }
        Self {
            keys,
            headings: HashMap::new(),
        }
    }
}

impl KeyTable {
    /// Map `heading` to `key`, also making it the heading written for `key`.
    #[must_use]
    pub fn with_alias(mut self, heading: &str, key: ColumnKey) -> Self {
        self.keys.insert(normalize(heading), key);
        self.headings.insert(key, heading.trim().to_string());
        self
    }

    /// Parse an alias definition of the form `HEADING=key`.
    ///
    /// # Examples
    /// ```
    /// use mdorchestra_converter::builder::{ColumnKey, KeyTable};
    ///
    /// let (heading, key) = KeyTable::parse_alias("Code=value").unwrap();
    /// assert_eq!(heading, "Code");
    /// assert_eq!(key, ColumnKey::Value);
    /// assert!(KeyTable::parse_alias("Code").is_err());
    /// ```
    pub fn parse_alias(definition: &str) -> Result<(String, ColumnKey)> {
        let (heading, key) = definition
            .split_once('=')
            .ok_or_else(|| ConverterError::InvalidAlias(definition.to_string()))?;
        let heading = heading.trim();
        if heading.is_empty() {
            return Err(ConverterError::InvalidAlias(definition.to_string()));
        }
        Ok((heading.to_string(), key.parse()?))
    }

    #[must_use]
    pub fn key_for(&self, heading: &str) -> Option<ColumnKey> {
        self.keys.get(&normalize(heading)).copied()
    }

    #[must_use]
    pub fn heading_for(&self, key: ColumnKey) -> &str {
        self.headings
            .get(&key)
            .map_or(key.default_heading(), String::as_str)
    }

    /// View a detail through this table.
    #[must_use]
    pub fn row<'a>(&'a self, detail: &'a Detail) -> Row<'a> {
        Row { detail, keys: self }
    }
}

/// A [`Detail`] addressed by [`ColumnKey`].
#[derive(Clone, Copy)]
pub struct Row<'a> {
    detail: &'a Detail,
    keys: &'a KeyTable,
}

impl<'a> Row<'a> {
    /// Trimmed, non-empty value of the first column mapping to `key`.
    #[must_use]
    pub fn get(&self, key: ColumnKey) -> Option<&'a str> {
        self.detail
            .properties()
            .filter(|(heading, _)| self.keys.key_for(heading) == Some(key))
            .map(|(_, value)| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Owned copy of [`Row::get`].
    #[must_use]
    pub fn text(&self, key: ColumnKey) -> Option<String> {
        self.get(key).map(str::to_string)
    }

    /// Value of `key` parsed as a number; `None` when absent or not numeric.
    #[must_use]
    pub fn number(&self, key: ColumnKey) -> Option<u32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    #[must_use]
    pub fn detail(&self) -> &'a Detail {
        self.detail
    }

    /// Headings present in the row that map to no key.
    pub fn unknown_headings(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.detail
            .properties()
            .map(|(heading, _)| heading)
            .filter(|heading| self.keys.key_for(heading).is_none())
    }
}
