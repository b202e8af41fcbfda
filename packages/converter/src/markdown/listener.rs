//! Event source: walks a [`MarkdownTree`] and emits [`DocumentEvent`]s.
//!
//! The heading hierarchy is tracked with an explicit stack holding the
//! current context of each open level. Prose is buffered per heading and
//! flushed as one documentation event when the next heading starts or the
//! document ends. Tables become detail tables; a table with exactly one data
//! row is also emitted as a single detail.

use std::rc::Rc;

use super::tree::{MarkdownTree, Node, NodeKind};
use crate::document::{Context, Detail, DetailTable, DocumentConsumer, DocumentEvent, Documentation};

/// Characters stripped from both ends of table cells.
const CELL_TRIM: &[char] = &[' ', '\t', '|'];

/// Walk `tree` and send every event to `consumer`.
pub fn emit_events(tree: &MarkdownTree, consumer: &mut dyn DocumentConsumer) {
    let mut source = EventSource::new(consumer);
    source.walk(&tree.root);
}

/// Stateful walker behind [`emit_events`].
pub struct EventSource<'a> {
    consumer: &'a mut dyn DocumentConsumer,
    headings: Vec<Rc<Context>>,
    blocks: Vec<String>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl<'a> EventSource<'a> {
    pub fn new(consumer: &'a mut dyn DocumentConsumer) -> Self {
        Self {
            consumer,
            headings: vec![Rc::new(Context::root())],
            blocks: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Visit `node` and its subtree.
    pub fn walk(&mut self, node: &Node) {
        self.enter(node);
        // List text is taken whole on exit, including nested lists.
        if node.kind != NodeKind::List {
            for child in &node.children {
                self.walk(child);
            }
        }
        self.exit(node);
    }

    fn current(&self) -> Rc<Context> {
        self.headings
            .last()
            .cloned()
            .unwrap_or_else(|| Rc::new(Context::root()))
    }

    fn enter(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Heading(_) => self.flush_documentation(),
            NodeKind::Table => {
                self.columns.clear();
                self.rows.clear();
            }
            _ => {}
        }
    }

    fn exit(&mut self, node: &Node) {
        match node.kind {
            NodeKind::Heading(level) => self.push_heading(&node.text, level),
            NodeKind::Paragraph => {
                let text = normalize_paragraph(&node.text);
                if !text.is_empty() {
                    self.blocks.push(text);
                }
            }
            NodeKind::List => {
                let mut lines = Vec::new();
                collect_list_lines(node, &mut lines);
                if !lines.is_empty() {
                    self.blocks.push(lines.join("\n"));
                }
            }
            NodeKind::TableHeading => {
                self.columns = node
                    .children_of(NodeKind::Cell)
                    .map(|c| trim_cell(&c.text).to_string())
                    .collect();
            }
            NodeKind::TableRow => {
                let cells = node
                    .children_of(NodeKind::Cell)
                    .map(|c| trim_cell(&c.text).to_string())
                    .collect();
                self.rows.push(cells);
            }
            NodeKind::Table => self.emit_table(),
            NodeKind::Document => self.flush_documentation(),
            NodeKind::ListItem | NodeKind::Cell => {}
        }
    }

    fn push_heading(&mut self, text: &str, level: usize) {
        while self.headings.last().is_some_and(|h| h.level() >= level) {
            self.headings.pop();
        }
        let parent = self.headings.last().cloned();
        let context = Rc::new(Context::new(text.split_whitespace(), level, parent));
        self.headings.push(Rc::clone(&context));
        self.consumer.consume(DocumentEvent::Heading(context));
    }

    fn flush_documentation(&mut self) {
        if self.blocks.is_empty() {
            return;
        }
        let text = self.blocks.join("\n");
        self.blocks.clear();
        let doc = Documentation::new(self.current(), text);
        self.consumer.consume(DocumentEvent::Documentation(doc));
    }

    fn emit_table(&mut self) {
        let context = self.current();
        let mut table = DetailTable::new(Rc::clone(&context));

        for (index, cells) in self.rows.iter().enumerate() {
            if cells.len() < self.columns.len() {
                tracing::warn!(
                    heading = %context.keys().join(" "),
                    row = index + 1,
                    expected = self.columns.len(),
                    found = cells.len(),
                    "Table row is missing cells"
                );
            } else if cells.len() > self.columns.len() {
                tracing::warn!(
                    heading = %context.keys().join(" "),
                    row = index + 1,
                    "Table row has more cells than headings, ignoring extras"
                );
            }

            let mut detail = Detail::new(Rc::clone(&context));
            for (column, cell) in self.columns.iter().zip(cells) {
                detail.add_property(column.as_str(), cell.as_str());
            }
            table.add_row(detail);
        }

        self.rows.clear();
        let single = match table.rows() {
            [only] => Some(only.clone()),
            _ => None,
        };
        self.consumer.consume(DocumentEvent::DetailTable(table));
        if let Some(detail) = single {
            self.consumer.consume(DocumentEvent::Detail(detail));
        }
    }
}

/// Strip the fixed set of non-text characters from both ends of a cell.
#[must_use]
pub fn trim_cell(text: &str) -> &str {
    text.trim_matches(CELL_TRIM)
}

fn normalize_paragraph(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_list_lines(list: &Node, lines: &mut Vec<String>) {
    for item in list.children_of(NodeKind::ListItem) {
        let text = normalize_paragraph(&item.text);
        if !text.is_empty() {
            lines.push(text);
        }
        for nested in item.children_of(NodeKind::List) {
            collect_list_lines(nested, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::parse;
    use pretty_assertions::assert_eq;

    fn events(markdown: &str) -> Vec<DocumentEvent> {
        let tree = parse(markdown);
        let mut events = Vec::new();
        emit_events(&tree, &mut events);
        events
    }

    fn describe(event: &DocumentEvent) -> String {
        match event {
            DocumentEvent::Heading(ctx) => format!("heading {}", ctx.keys().join(" ")),
            DocumentEvent::Documentation(doc) => format!("doc {}", doc.text()),
            DocumentEvent::Detail(d) => format!("detail {}", d.len()),
            DocumentEvent::DetailTable(t) => format!("table {}", t.rows().len()),
        }
    }

    #[test]
    fn test_documentation_flushed_at_next_heading() {
        let events = events("## Message Order\n\nFirst\nline.\n\nSecond.\n\n## Fields\n");
        let described: Vec<String> = events.iter().map(describe).collect();
        assert_eq!(
            described,
            vec![
                "heading Message Order",
                "doc First line.\nSecond.",
                "heading Fields",
            ]
        );
        assert!(events[1].context().is(events[0].context()));
    }

    #[test]
    fn test_documentation_flushed_at_end() {
        let events = events("# Protocol\n\n- one\n- two\n");
        assert_eq!(describe(&events[1]), "doc one\ntwo");
    }

    #[test]
    fn test_prose_before_first_heading_belongs_to_root() {
        let events = events("Preamble.\n\n# Protocol\n");
        let DocumentEvent::Documentation(doc) = &events[0] else {
            panic!("expected documentation first");
        };
        assert_eq!(doc.context().level(), 1);
        assert!(doc.context().keys().is_empty());
    }

    #[test]
    fn test_heading_parents_follow_levels() {
        let events = events("# Protocol\n## Actor Trader\n### StateMachine Order\n## Fields\n");
        let contexts: Vec<&Rc<Context>> = events.iter().map(DocumentEvent::context).collect();

        assert!(contexts[0].parent().is_none());
        assert!(contexts[1].parent().is_some_and(|p| p.is(contexts[0])));
        assert!(contexts[2].parent().is_some_and(|p| p.is(contexts[1])));
        assert!(contexts[3].parent().is_some_and(|p| p.is(contexts[0])));
    }

    #[test]
    fn test_skipped_heading_level_uses_nearest_lower() {
        let events = events("# Protocol\n### Deep\n");
        assert_eq!(events[1].context().level(), 3);
        assert!(events[1].context().parent().is_some_and(|p| p.level() == 1));
    }

    #[test]
    fn test_single_row_table_emits_detail_too() {
        let events = events("## Flow Orders\n\n| Source | Destination |\n|---|---|\n| Buy | Sell |\n");
        let described: Vec<String> = events.iter().map(describe).collect();
        assert_eq!(described, vec!["heading Flow Orders", "table 1", "detail 2"]);

        let DocumentEvent::Detail(detail) = &events[2] else {
            panic!("expected detail");
        };
        assert_eq!(detail.get("source"), Some("Buy"));
    }

    #[test]
    fn test_multi_row_table_emits_only_table() {
        let events = events("## Fields\n\n| Name | Tag |\n|---|---|\n| Side | 54 |\n| Price | 44 |\n");
        let described: Vec<String> = events.iter().map(describe).collect();
        assert_eq!(described, vec!["heading Fields", "table 2"]);
    }

    #[test]
    fn test_table_between_prose_keeps_order() {
        let events = events("## Codeset Side\n\nIntro.\n\n| Name | Value |\n|---|---|\n| Buy | 1 |\n| Sell | 2 |\n\nOutro.\n");
        let described: Vec<String> = events.iter().map(describe).collect();
        assert_eq!(
            described,
            vec!["heading Codeset Side", "table 2", "doc Intro.\nOutro."]
        );
    }

    #[test]
    fn test_trim_cell_only_ends() {
        assert_eq!(trim_cell(" |\tvalue | x\t| "), "value | x");
        assert_eq!(trim_cell("||"), "");
    }

    #[test]
    fn test_nested_list_flattened() {
        let events = events("# P\n\n- one\n  - nested\n- two\n");
        assert_eq!(describe(&events[1]), "doc one\nnested\ntwo");
    }
}
