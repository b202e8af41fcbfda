//! Fields, code sets and datatypes.

use super::codes::{looks_like_codes, parse_inline_codes};
use super::declare::HeadingAttributes;
use super::deferred::PendingStep;
use super::keys::{ColumnKey, Row};
use super::presence::CellError;
use super::{EntityRef, RepositoryBuilder};
use crate::config::DEFAULT_SCENARIO;
use crate::document::{Detail, DetailTable};
use crate::repository::{
    Code, Datatype, EntityKind, Field, Lookup, MappedDatatype, Target, IMMEDIATE_ORDER,
};

/// Attributes of one field definition, from a Fields table row, a Field
/// heading or the single-row table below it.
#[derive(Debug, Clone, Default)]
pub(super) struct FieldRow {
    pub name: String,
    pub scenario: String,
    pub tag: Option<u32>,
    pub type_name: Option<String>,
    pub values: Option<String>,
    pub category: Option<String>,
    pub abbr_name: Option<String>,
    pub discriminator: Option<String>,
    pub documentation: Option<String>,
}

impl FieldRow {
    fn from_heading(attributes: HeadingAttributes) -> Self {
        Self {
            name: attributes.name,
            scenario: attributes.scenario,
            tag: attributes.id,
            type_name: attributes.type_name,
            category: attributes.category,
            abbr_name: attributes.abbr_name,
            ..Self::default()
        }
    }

    /// Read a row; `name` and `scenario` fill in for absent cells.
    fn read(row: Row<'_>, name: Option<&str>, scenario: &str) -> Result<Self, String> {
        let name = row
            .get(ColumnKey::Name)
            .or(name)
            .ok_or_else(|| "has no name".to_string())?;
        let tag = match row.get(ColumnKey::Tag) {
            Some(text) => Some(
                text.parse()
                    .map_err(|_| format!("field {name} has an invalid tag '{text}'"))?,
            ),
            None => None,
        };
        Ok(Self {
            name: name.to_string(),
            scenario: row
                .text(ColumnKey::Scenario)
                .unwrap_or_else(|| scenario.to_string()),
            tag,
            type_name: row.text(ColumnKey::Type),
            values: row.text(ColumnKey::Values),
            category: row.text(ColumnKey::Category),
            abbr_name: row.text(ColumnKey::AbbrName),
            discriminator: row.text(ColumnKey::Discriminator),
            documentation: row.text(ColumnKey::Documentation),
        })
    }
}

#[derive(Debug)]
struct CodeRow {
    name: Option<String>,
    value: Option<String>,
    id: Option<u32>,
    sort: Option<String>,
    documentation: Option<String>,
}

impl RepositoryBuilder {
    pub(super) fn declare_field(&mut self, attributes: HeadingAttributes) -> EntityRef {
        let row = FieldRow::from_heading(attributes);
        let entity = EntityRef::Field {
            name: row.name.clone(),
            scenario: row.scenario.clone(),
        };
        self.upsert_field(row);
        entity
    }

    /// One field per row of a Fields table.
    pub(super) fn define_fields(&mut self, table: &DetailTable) {
        let rows: Vec<Result<FieldRow, String>> = table
            .rows()
            .iter()
            .map(|detail| {
                FieldRow::read(self.config.keys.row(detail), None, DEFAULT_SCENARIO)
            })
            .collect();
        for (index, row) in rows.into_iter().enumerate() {
            match row {
                Ok(row) => self.upsert_field(row),
                Err(message) => self
                    .diagnostics
                    .error(format!("Fields row {}: {message}", index + 1)),
            }
        }
    }

    /// Properties of the field declared by the enclosing heading.
    pub(super) fn describe_field(&mut self, name: &str, scenario: &str, detail: &Detail) {
        match FieldRow::read(self.config.keys.row(detail), Some(name), scenario) {
            Ok(mut row) => {
                row.name = name.to_string();
                row.scenario = scenario.to_string();
                self.upsert_field(row);
            }
            Err(message) => self.diagnostics.error(format!("Field {name}: {message}")),
        }
    }

    /// Create a field or update the attributes of an existing one.
    ///
    /// The id of an existing field is kept even when the row names another tag.
    pub(super) fn upsert_field(&mut self, row: FieldRow) {
        let target = Target::Name(row.name.clone());
        let existing_id = self.repository.field(&target, &row.scenario).map(|f| f.id);
        match (existing_id, row.tag) {
            (Some(id), Some(tag)) if id != tag => self.diagnostics.warn(format!(
                "Field {} redefined with tag {tag}; keeping tag {id}",
                row.name
            )),
            (None, _) => {
                let id = self.assign_id(
                    EntityKind::Field,
                    &row.name,
                    &row.scenario,
                    row.tag,
                    &[&row.name],
                );
                self.repository.add_field(Field {
                    name: row.name.clone(),
                    id,
                    scenario: row.scenario.clone(),
                    ..Field::default()
                });
            }
            _ => {}
        }

        let discriminator = row
            .discriminator
            .as_deref()
            .and_then(|text| self.discriminator_id(&row.name, &row.scenario, text));
        let codes = row.values.as_deref().filter(|v| looks_like_codes(v));

        if let Some(field) = self.repository.field_mut(&target, &row.scenario) {
            if codes.is_none() && row.type_name.is_some() {
                field.type_name.clone_from(&row.type_name);
            }
            field.category = row.category.clone().or(field.category.take());
            field.abbr_name = row.abbr_name.clone().or(field.abbr_name.take());
            field.discriminator_id = discriminator.or(field.discriminator_id);
            if let Some(text) = &row.documentation {
                field.annotation.push(None, text.clone());
            }
        }

        match (codes, &row.type_name) {
            (Some(codes), _) => {
                self.define_inline_codes(&row.name, &row.scenario, codes, row.type_name.clone());
            }
            (None, Some(type_name)) if self.reference.is_some() => {
                self.queue.push(PendingStep::ResolveFieldType {
                    field: row.name.clone(),
                    scenario: row.scenario.clone(),
                    type_name: type_name.clone(),
                });
            }
            _ => {}
        }
    }

    fn discriminator_id(&mut self, field: &str, scenario: &str, text: &str) -> Option<u32> {
        if let Ok(id) = text.parse() {
            return Some(id);
        }
        let found = Lookup::new(&self.repository, None)
            .find(
                &IMMEDIATE_ORDER,
                EntityKind::Field,
                &Target::Name(text.to_string()),
                scenario,
            )
            .map(|(_, resolved)| resolved.id);
        if found.is_none() {
            self.diagnostics.warn(format!(
                "Field {field}: unknown discriminator '{text}'"
            ));
        }
        found
    }

    /// Turn an inline code list into `<field>CodeSet` and retype the field.
    ///
    /// Returns the code set name.
    pub(super) fn define_inline_codes(
        &mut self,
        field: &str,
        scenario: &str,
        text: &str,
        type_name: Option<String>,
    ) -> String {
        let parsed = parse_inline_codes(text);
        let set_name = format!("{field}CodeSet");
        let set_scenario = self.ensure_code_set(&set_name, scenario, None, type_name);

        let codes: Vec<Code> = parsed
            .codes
            .into_iter()
            .map(|code| Code {
                id: self.ids.generate(&[set_name.as_str(), code.name.as_str()]),
                name: code.name,
                value: code.value,
                ..Code::default()
            })
            .collect();
        let set_target = Target::Name(set_name.clone());
        if let Some(code_set) = self.repository.code_set_mut(&set_target, &set_scenario) {
            code_set.codes.extend(codes);
        }
        if let Some(remainder) = parsed.remainder {
            self.diagnostics.error(format!(
                "Code set {set_name}: {}",
                CellError::UnmatchedCodes(remainder)
            ));
        }

        if let Some(owner) = self
            .repository
            .field_mut(&Target::Name(field.to_string()), scenario)
        {
            owner.type_name = Some(set_name.clone());
        }
        tracing::debug!(field, code_set = %set_name, scenario = %set_scenario, "Inline codes");
        set_name
    }

    /// Codes of the code set declared by the enclosing heading.
    pub(super) fn add_codes(&mut self, set_name: &str, scenario: &str, table: &DetailTable) {
        let rows: Vec<CodeRow> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                CodeRow {
                    name: row.text(ColumnKey::Name),
                    value: row.text(ColumnKey::Value),
                    id: row.number(ColumnKey::Tag),
                    sort: row.text(ColumnKey::Sort),
                    documentation: row.text(ColumnKey::Documentation),
                }
            })
            .collect();

        let mut codes = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            let (Some(name), Some(value)) = (row.name, row.value) else {
                self.diagnostics.error(format!(
                    "Code set {set_name} row {}: a code needs a name and a value",
                    index + 1
                ));
                continue;
            };
            let mut code = Code {
                id: row
                    .id
                    .unwrap_or_else(|| self.ids.generate(&[set_name, name.as_str()])),
                name,
                value,
                sort: row.sort,
                ..Code::default()
            };
            if let Some(text) = row.documentation {
                code.annotation.push(None, text);
            }
            codes.push(code);
        }

        let target = Target::Name(set_name.to_string());
        if let Some(code_set) = self.repository.code_set_mut(&target, scenario) {
            code_set.codes.extend(codes);
        }
    }

    /// Code sets listed one per row, without codes.
    pub(super) fn define_code_sets(&mut self, table: &DetailTable) {
        let rows: Vec<(Option<String>, Option<u32>, Option<String>, String, Option<String>)> =
            table
                .rows()
                .iter()
                .map(|detail| {
                    let row = self.config.keys.row(detail);
                    (
                        row.text(ColumnKey::Name),
                        row.number(ColumnKey::Tag),
                        row.text(ColumnKey::Type),
                        row.text(ColumnKey::Scenario)
                            .unwrap_or_else(|| DEFAULT_SCENARIO.to_string()),
                        row.text(ColumnKey::Documentation),
                    )
                })
                .collect();
        for (index, row) in rows.into_iter().enumerate() {
            let (name, id, type_name, scenario, documentation) = row;
            let Some(name) = name else {
                self.diagnostics
                    .error(format!("Code sets row {}: has no name", index + 1));
                continue;
            };
            let scenario = self.ensure_code_set(&name, &scenario, id, type_name);
            if let (Some(text), Some(code_set)) = (
                documentation,
                self.repository
                    .code_set_mut(&Target::Name(name.clone()), &scenario),
            ) {
                code_set.annotation.push(None, text);
            }
        }
    }

    /// One datatype per row of a Datatypes table.
    pub(super) fn define_datatypes(&mut self, table: &DetailTable) {
        let rows: Vec<(Option<String>, Option<String>, Option<String>)> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                (
                    row.text(ColumnKey::Name),
                    row.text(ColumnKey::Base).or_else(|| row.text(ColumnKey::Type)),
                    row.text(ColumnKey::Documentation),
                )
            })
            .collect();
        for (index, (name, base_type, documentation)) in rows.into_iter().enumerate() {
            let Some(name) = name else {
                self.diagnostics
                    .error(format!("Datatypes row {}: has no name", index + 1));
                continue;
            };
            if self.repository.datatype(&name).is_none() {
                self.repository.add_datatype(Datatype {
                    name: name.clone(),
                    ..Datatype::default()
                });
            }
            if let Some(datatype) = self.repository.datatype_mut(&name) {
                datatype.base_type = base_type.or(datatype.base_type.take());
                if let Some(text) = documentation {
                    datatype.annotation.push(None, text);
                }
            }
        }
    }

    /// Standard mappings of the datatype declared by the enclosing heading.
    pub(super) fn add_mappings(&mut self, datatype: &str, table: &DetailTable) {
        let rows: Vec<Option<MappedDatatype>> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                let mut mapping = MappedDatatype {
                    standard: row.text(ColumnKey::Standard)?,
                    base: row.text(ColumnKey::Base),
                    builtin: row.text(ColumnKey::Builtin),
                    element: row.text(ColumnKey::Element),
                    parameter: row.text(ColumnKey::Parameter),
                    min_inclusive: row.text(ColumnKey::MinInclusive),
                    max_inclusive: row.text(ColumnKey::MaxInclusive),
                    ..MappedDatatype::default()
                };
                if let Some(text) = row.text(ColumnKey::Documentation) {
                    mapping.annotation.push(None, text);
                }
                Some(mapping)
            })
            .collect();

        let mut mappings = Vec::new();
        for (index, mapping) in rows.into_iter().enumerate() {
            match mapping {
                Some(mapping) => mappings.push(mapping),
                None => self.diagnostics.error(format!(
                    "Datatype {datatype} row {}: mapping has no standard",
                    index + 1
                )),
            }
        }
        if let Some(target) = self.repository.datatype_mut(datatype) {
            target.mappings.extend(mappings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildOutput;
    use crate::config::BuilderConfig;
    use crate::diagnostics::Severity;
    use crate::markdown::{emit_events, parse};
    use pretty_assertions::assert_eq;

    fn build(markdown: &str) -> BuildOutput {
        let mut builder = RepositoryBuilder::new(BuilderConfig::default()).unwrap();
        emit_events(&parse(markdown), &mut builder);
        builder.finish()
    }

    #[test]
    fn test_fields_table() {
        let output = build(
            "## Fields\n\n| Tag | Name | Type | AbbrName | Description |\n|---|---|---|---|---|\n| 54 | Side | char | Sd | Side of order |\n| 44 | Price | Price |  |  |\n",
        );
        let fields = &output.repository.fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].id, 54);
        assert_eq!(fields[0].type_name.as_deref(), Some("char"));
        assert_eq!(fields[0].abbr_name.as_deref(), Some("Sd"));
        assert_eq!(fields[0].annotation.0[0].text, "Side of order");
        assert_eq!(fields[1].name, "Price");
    }

    #[test]
    fn test_inline_codes_create_code_set() {
        let output = build(
            "## Fields\n\n| Tag | Name | Type | Values |\n|---|---|---|---|\n| 54 | Side | char | 1=Buy 2=Sell |\n",
        );
        let repository = &output.repository;
        assert_eq!(repository.fields[0].type_name.as_deref(), Some("SideCodeSet"));
        let code_set = &repository.code_sets[0];
        assert_eq!(code_set.name, "SideCodeSet");
        assert_eq!(code_set.type_name.as_deref(), Some("char"));
        let codes: Vec<(&str, &str)> = code_set
            .codes
            .iter()
            .map(|c| (c.value.as_str(), c.name.as_str()))
            .collect();
        assert_eq!(codes, vec![("1", "Buy"), ("2", "Sell")]);
        assert!(code_set.codes.iter().all(|c| (5000..40000).contains(&c.id)));
    }

    #[test]
    fn test_inline_codes_remainder_is_error() {
        let output = build(
            "## Fields\n\n| Tag | Name | Values |\n|---|---|---|\n| 54 | Side | 1=Buy 2= |\n",
        );
        assert_eq!(output.repository.code_sets[0].codes.len(), 1);
        assert!(output.diagnostics.contains(Severity::Error, "2="));
    }

    #[test]
    fn test_field_heading_with_detail() {
        let output = build(
            "## Field ClOrdID (11)\n\nUnique order id.\n\n| Type | Category |\n|---|---|\n| String | Common |\n",
        );
        let field = &output.repository.fields[0];
        assert_eq!(field.id, 11);
        assert_eq!(field.type_name.as_deref(), Some("String"));
        assert_eq!(field.category.as_deref(), Some("Common"));
        assert_eq!(field.annotation.0[0].text, "Unique order id.");
    }

    #[test]
    fn test_redefined_tag_keeps_first() {
        let output = build(
            "## Fields\n\n| Tag | Name |\n|---|---|\n| 54 | Side |\n| 55 | Side |\n",
        );
        assert_eq!(output.repository.fields.len(), 1);
        assert_eq!(output.repository.fields[0].id, 54);
        assert!(output.diagnostics.contains(Severity::Warn, "keeping tag 54"));
    }

    #[test]
    fn test_discriminator_by_name() {
        let output = build(
            "## Fields\n\n| Tag | Name | Discriminator |\n|---|---|---|\n| 447 | PartyIDSource |  |\n| 448 | PartyID | PartyIDSource |\n",
        );
        assert_eq!(output.repository.fields[1].discriminator_id, Some(447));
    }

    #[test]
    fn test_code_set_heading_with_codes() {
        let output = build(
            "## CodeSet SideCodeSet type char (54)\n\n| Name | Value | Id | Sort |\n|---|---|---|---|\n| Buy | 1 | 54001 | 1 |\n| Sell | 2 |  |  |\n|  | 3 |  |  |\n",
        );
        let code_set = &output.repository.code_sets[0];
        assert_eq!(code_set.id, 54);
        assert_eq!(code_set.type_name.as_deref(), Some("char"));
        assert_eq!(code_set.codes.len(), 2);
        assert_eq!(code_set.codes[0].id, 54001);
        assert_eq!(code_set.codes[0].sort.as_deref(), Some("1"));
        assert_eq!(output.diagnostics.error_count(), 1);
    }

    #[test]
    fn test_duplicate_code_set_moves_to_dup_scenario() {
        let output = build(
            "## CodeSet SideCodeSet\n\n| Name | Value |\n|---|---|\n| Buy | 1 |\n\n## CodeSet SideCodeSet\n\n| Name | Value |\n|---|---|\n| Sell | 2 |\n",
        );
        let scenarios: Vec<&str> = output
            .repository
            .code_sets
            .iter()
            .map(|c| c.scenario.as_str())
            .collect();
        assert_eq!(scenarios, vec!["base", "baseDup"]);
        assert_eq!(output.repository.code_sets[1].codes[0].name, "Sell");
        assert!(output.diagnostics.contains(Severity::Error, "baseDup"));
    }

    #[test]
    fn test_datatypes_and_mappings() {
        let output = build(
            "## Datatypes\n\n| Name | Base | Description |\n|---|---|---|\n| int |  | Integer |\n| Length | int |  |\n\n## Datatype Price\n\n| Standard | Base | Builtin |\n|---|---|---|\n| XML | xs:decimal | Y |\n| JSON | number |  |\n",
        );
        let datatypes = &output.repository.datatypes;
        assert_eq!(datatypes.len(), 3);
        assert_eq!(datatypes[1].base_type.as_deref(), Some("int"));
        let price = &datatypes[2];
        assert_eq!(price.mappings.len(), 2);
        assert_eq!(price.mappings[0].base.as_deref(), Some("xs:decimal"));
        assert_eq!(price.mappings[1].standard, "JSON");
    }
}
