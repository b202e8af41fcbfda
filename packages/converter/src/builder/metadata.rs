//! Repository metadata, categories and sections, and table dispatch.

use super::deferred::MemberOwner;
use super::keys::ColumnKey;
use super::{EntityRef, RepositoryBuilder, SectionKind};
use crate::document::{Context, Detail, DetailTable, DocumentEvent};
use crate::repository::{Category, Section};

impl RepositoryBuilder {
    /// Events at document level: the repository heading, its documentation
    /// and metadata tables.
    pub(super) fn on_root(&mut self, event: DocumentEvent) {
        match event {
            DocumentEvent::Heading(heading) => {
                let name: Vec<&str> = heading
                    .keys()
                    .iter()
                    .map(String::as_str)
                    .take_while(|k| !k.eq_ignore_ascii_case("version"))
                    .collect();
                if !name.is_empty() {
                    self.repository.set_name(name.join(" "));
                }
                if let Some(version) = heading.get_key_value("version") {
                    self.repository.set_version(version);
                }
            }
            DocumentEvent::Documentation(doc) => {
                self.repository.annotation_mut().push(None, doc.text());
            }
            DocumentEvent::DetailTable(table) => self.add_metadata(&table),
            DocumentEvent::Detail(_) => {}
        }
    }

    /// A table with `term` and `value` columns lists terms; in any other
    /// table each cell is a term named by its column.
    fn add_metadata(&mut self, table: &DetailTable) {
        let keys = &self.config.keys;
        let mut terms = Vec::new();
        for detail in table.rows() {
            let row = keys.row(detail);
            match row.get(ColumnKey::Term) {
                Some(term) => terms.push((
                    term.to_string(),
                    row.text(ColumnKey::Value).unwrap_or_default(),
                )),
                None => terms.extend(
                    detail
                        .properties()
                        .filter(|(_, value)| !value.trim().is_empty())
                        .map(|(heading, value)| (heading.to_string(), value.trim().to_string())),
                ),
            }
        }
        for (term, value) in terms {
            self.repository.add_metadata_term(term, value);
        }
    }

    /// Route a table to the handler for its section and active entity.
    pub(super) fn on_table(&mut self, kind: SectionKind, section: &Context, table: &DetailTable) {
        self.warn_unknown_columns(kind, table);
        match (kind, self.entity_for(kind, section)) {
            (SectionKind::Datatype, Some(EntityRef::Datatype(name))) => {
                self.add_mappings(&name, table);
            }
            (SectionKind::Datatype, None) => self.define_datatypes(table),
            (SectionKind::CodeSet, Some(EntityRef::CodeSet { name, scenario })) => {
                self.add_codes(&name, &scenario, table);
            }
            (SectionKind::CodeSet, None) => self.define_code_sets(table),
            (SectionKind::Field, Some(EntityRef::Field { name, scenario })) => match table.rows() {
                [detail] => self.describe_field(&name, &scenario, detail),
                rows => self.diagnostics.warn(format!(
                    "Field {name}: expected one row of properties, found {}",
                    rows.len()
                )),
            },
            (SectionKind::Field, None) => self.define_fields(table),
            (SectionKind::Component, Some(EntityRef::Component { name, scenario })) => {
                self.add_members(&MemberOwner::Component { name, scenario }, table);
            }
            (SectionKind::Group, Some(EntityRef::Group { name, scenario })) => {
                self.add_members(&MemberOwner::Group { name, scenario }, table);
            }
            (SectionKind::Message, Some(EntityRef::Message { name, scenario })) => {
                self.add_members(&MemberOwner::Message { name, scenario }, table);
            }
            (SectionKind::Responses, Some(EntityRef::Message { name, scenario })) => {
                self.add_responses(&name, &scenario, table);
            }
            (SectionKind::Actor | SectionKind::Variables, Some(EntityRef::Actor(name))) => {
                self.add_members(&MemberOwner::Actor { name }, table);
            }
            (SectionKind::StateMachine, Some(EntityRef::StateMachine { actor, name })) => {
                self.add_transitions(&actor, &name, table);
            }
            (SectionKind::Flow, Some(EntityRef::Flow(name))) => {
                if table.rows().len() > 1 {
                    self.diagnostics.warn(format!(
                        "Flow {name}: only a single-row table describes a flow"
                    ));
                }
            }
            (SectionKind::Session | SectionKind::Identifiers, Some(EntityRef::Session(name))) => {
                self.add_identifiers(&name, table);
            }
            (SectionKind::Categories, _) => self.define_categories(table),
            (SectionKind::Sections, _) => self.define_sections(table),
            (kind, _) => self.diagnostics.warn(format!(
                "Table in {kind:?} section '{}' has no entity to describe",
                section.keys().join(" ")
            )),
        }
    }

    /// Single-row tables arrive a second time as a detail; only flows use it.
    pub(super) fn on_detail(&mut self, kind: SectionKind, section: &Context, detail: &Detail) {
        if let (SectionKind::Flow, Some(EntityRef::Flow(name))) =
            (kind, self.entity_for(kind, section))
        {
            self.describe_flow(&name, detail);
        }
    }

    fn warn_unknown_columns(&mut self, kind: SectionKind, table: &DetailTable) {
        let unknown: Vec<String> = table
            .columns()
            .into_iter()
            .map(|c| c.heading)
            .filter(|h| self.config.keys.key_for(h).is_none())
            .collect();
        for heading in unknown {
            self.diagnostics
                .warn(format!("Column '{heading}' in {kind:?} table ignored"));
        }
    }

    fn define_categories(&mut self, table: &DetailTable) {
        let rows: Vec<Option<Category>> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                let mut category = Category {
                    name: row.text(ColumnKey::Name)?,
                    section: row.text(ColumnKey::Section),
                    kind: row.text(ColumnKey::Kind),
                    ..Category::default()
                };
                if let Some(text) = row.text(ColumnKey::Documentation) {
                    category.annotation.push(None, text);
                }
                Some(category)
            })
            .collect();
        for (index, category) in rows.into_iter().enumerate() {
            match category {
                Some(category) => self.repository.add_category(category),
                None => self
                    .diagnostics
                    .error(format!("Categories row {}: has no name", index + 1)),
            }
        }
    }

    fn define_sections(&mut self, table: &DetailTable) {
        let rows: Vec<(Option<String>, Option<String>, Option<String>)> = table
            .rows()
            .iter()
            .map(|detail| {
                let row = self.config.keys.row(detail);
                (
                    row.text(ColumnKey::Name),
                    row.text(ColumnKey::DisplayOrder),
                    row.text(ColumnKey::Documentation),
                )
            })
            .collect();
        for (index, (name, order, documentation)) in rows.into_iter().enumerate() {
            let Some(name) = name else {
                self.diagnostics
                    .error(format!("Sections row {}: has no name", index + 1));
                continue;
            };
            let display_order = match order.as_deref().map(str::parse::<u32>) {
                Some(Ok(order)) => Some(order),
                Some(Err(_)) => {
                    self.diagnostics.error(format!(
                        "Section {name}: invalid display order '{}'",
                        order.unwrap_or_default()
                    ));
                    None
                }
                None => None,
            };
            let mut section = Section {
                name,
                display_order,
                ..Section::default()
            };
            if let Some(text) = documentation {
                section.annotation.push(None, text);
            }
            self.repository.add_section(section);
        }
    }
}
