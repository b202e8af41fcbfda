//! Key/value property sets and tables of them.

use std::rc::Rc;

use indexmap::IndexMap;

use super::context::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Property {
    key: String,
    value: String,
}

/// One set of properties attached to a context, e.g. one table row.
///
/// Keys are compared case-insensitively but keep their original spelling
/// and insertion order.
#[derive(Debug, Clone)]
pub struct Detail {
    context: Rc<Context>,
    properties: IndexMap<String, Property>,
}

impl Detail {
    #[must_use]
    pub fn new(context: Rc<Context>) -> Self {
        Self {
            context,
            properties: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    /// Set a property. Re-adding a key replaces the value in place.
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.get_mut(&key.to_lowercase()) {
            Some(existing) => existing.value = value,
            None => {
                self.properties
                    .insert(key.to_lowercase(), Property { key, value });
            }
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .get(&key.to_lowercase())
            .map(|p| p.value.as_str())
    }

    /// Properties in insertion order, with keys as originally written.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .values()
            .map(|p| (p.key.as_str(), p.value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Column of a [`DetailTable`] as rendered by a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Heading as first written.
    pub heading: String,
    /// Widest of the heading and all values, in characters.
    pub width: usize,
}

/// Rows of properties sharing a column schema.
#[derive(Debug, Clone)]
pub struct DetailTable {
    context: Rc<Context>,
    rows: Vec<Detail>,
}

impl DetailTable {
    #[must_use]
    pub fn new(context: Rc<Context>) -> Self {
        Self {
            context,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    pub fn add_row(&mut self, row: Detail) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[Detail] {
        &self.rows
    }

    /// Union of row keys in first-seen order, with rendering widths.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let mut columns: IndexMap<String, Column> = IndexMap::new();
        for row in &self.rows {
            for (key, value) in row.properties() {
                let column = columns.entry(key.to_lowercase()).or_insert_with(|| Column {
                    heading: key.to_string(),
                    width: key.chars().count(),
                });
                column.width = column.width.max(value.chars().count());
            }
        }
        columns.into_values().collect()
    }
}
