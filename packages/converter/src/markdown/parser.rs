//! Markdown front end: pulldown-cmark events to a [`MarkdownTree`].

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::tree::{MarkdownTree, Node, NodeKind};

/// Parse Markdown text into a tree of headings, prose, lists and tables.
///
/// GFM tables are enabled. Code blocks, HTML blocks and images do not
/// contribute text. Parsing never fails: pulldown-cmark accepts any input.
///
/// # Examples
/// ```
/// use mdorchestra_converter::markdown::{parse, NodeKind};
///
/// let tree = parse("# Title\n\nSome prose.\n");
/// assert_eq!(tree.root.children[0].kind, NodeKind::Heading(1));
/// assert_eq!(tree.root.children[1].text, "Some prose.");
/// ```
#[must_use]
pub fn parse(text: &str) -> MarkdownTree {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(text, Options::ENABLE_TABLES) {
        builder.event(event);
    }
    builder.finish()
}

struct TreeBuilder {
    stack: Vec<Node>,
    /// Depth inside elements whose text is ignored.
    skip: usize,
    /// One entry per open paragraph: `true` when merged into a list item.
    paragraphs: Vec<bool>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::new(NodeKind::Document)],
            skip: 0,
            paragraphs: Vec::new(),
        }
    }

    fn top_kind(&self) -> NodeKind {
        self.stack.last().map_or(NodeKind::Document, |n| n.kind)
    }

    fn open(&mut self, kind: NodeKind) {
        self.stack.push(Node::new(kind));
    }

    fn close(&mut self, expected: fn(NodeKind) -> bool) {
        if self.stack.len() < 2 || !expected(self.top_kind()) {
            tracing::debug!(top = ?self.top_kind(), "Unbalanced end event, ignoring");
            return;
        }
        if let Some(node) = self.stack.pop() {
            if let Some(parent) = self.stack.last_mut() {
                parent.children.push(node);
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.skip > 0 {
            return;
        }
        if let Some(node) = self.stack.last_mut() {
            if node.kind.holds_text() {
                node.text.push_str(text);
            }
        }
    }

    fn line_break(&mut self, hard: bool) {
        let separator = match self.top_kind() {
            NodeKind::Paragraph => "\n",
            NodeKind::Cell if hard => "\n",
            _ => " ",
        };
        self.push_text(separator);
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak => self.line_break(false),
            Event::HardBreak => self.line_break(true),
            Event::InlineHtml(html) if is_line_break_html(&html) => self.line_break(true),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => self.open(NodeKind::Heading(level as usize)),
            Tag::Paragraph => {
                let merged = self.top_kind() == NodeKind::ListItem;
                if merged {
                    if let Some(item) = self.stack.last_mut() {
                        if !item.text.is_empty() && !item.text.ends_with(char::is_whitespace) {
                            item.text.push(' ');
                        }
                    }
                } else {
                    self.open(NodeKind::Paragraph);
                }
                self.paragraphs.push(merged);
            }
            Tag::List(_) => self.open(NodeKind::List),
            Tag::Item => self.open(NodeKind::ListItem),
            Tag::Table(_) => self.open(NodeKind::Table),
            Tag::TableHead => self.open(NodeKind::TableHeading),
            Tag::TableRow => self.open(NodeKind::TableRow),
            Tag::TableCell => self.open(NodeKind::Cell),
            Tag::CodeBlock(_) | Tag::HtmlBlock | Tag::Image { .. } | Tag::MetadataBlock(_) => {
                self.skip += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => self.close(|k| matches!(k, NodeKind::Heading(_))),
            TagEnd::Paragraph => {
                if !self.paragraphs.pop().unwrap_or(false) {
                    self.close(|k| k == NodeKind::Paragraph);
                }
            }
            TagEnd::List(_) => self.close(|k| k == NodeKind::List),
            TagEnd::Item => self.close(|k| k == NodeKind::ListItem),
            TagEnd::Table => self.close(|k| k == NodeKind::Table),
            TagEnd::TableHead => self.close(|k| k == NodeKind::TableHeading),
            TagEnd::TableRow => self.close(|k| k == NodeKind::TableRow),
            TagEnd::TableCell => self.close(|k| k == NodeKind::Cell),
            TagEnd::CodeBlock | TagEnd::HtmlBlock | TagEnd::Image | TagEnd::MetadataBlock(_) => {
                self.skip = self.skip.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn finish(mut self) -> MarkdownTree {
        while self.stack.len() > 1 {
            self.close(|_| true);
        }
        let root = self
            .stack
            .pop()
            .unwrap_or_else(|| Node::new(NodeKind::Document));
        MarkdownTree { root }
    }
}

fn is_line_break_html(html: &str) -> bool {
    let tag: String = html
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect();
    tag.eq_ignore_ascii_case("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_heading_levels() {
        let tree = parse("# Protocol\n\n## Message Order\n\n### Responses\n");
        let kinds: Vec<NodeKind> = tree.root.children.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Heading(1),
                NodeKind::Heading(2),
                NodeKind::Heading(3)
            ]
        );
        assert_eq!(tree.root.children[1].text, "Message Order");
    }

    #[test]
    fn test_parse_paragraph_keeps_lines() {
        let tree = parse("First line\nsecond line\n");
        assert_eq!(tree.root.children[0].kind, NodeKind::Paragraph);
        assert_eq!(tree.root.children[0].text, "First line\nsecond line");
    }

    #[test]
    fn test_parse_inline_markup_contributes_text() {
        let tree = parse("Uses *emphasis* and `code` text.\n");
        assert_eq!(tree.root.children[0].text, "Uses emphasis and code text.");
    }

    #[test]
    fn test_parse_list_items() {
        let tree = parse("- one\n- two\n");
        let list = &tree.root.children[0];
        assert_eq!(list.kind, NodeKind::List);
        let items: Vec<&str> = list
            .children_of(NodeKind::ListItem)
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(items, vec!["one", "two"]);
    }

    #[test]
    fn test_parse_loose_list_merges_paragraphs() {
        let tree = parse("- one\n\n  more\n\n- two\n");
        let list = &tree.root.children[0];
        assert_eq!(list.children[0].text, "one more");
        assert!(list.children[0].children.is_empty());
    }

    #[test]
    fn test_parse_table() {
        let tree = parse("| Name | Tag |\n|---|---|\n| Side | 54 |\n");
        let table = &tree.root.children[0];
        assert_eq!(table.kind, NodeKind::Table);

        let heading = table.children_of(NodeKind::TableHeading).next().unwrap();
        let headings: Vec<&str> = heading.children.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(headings, vec!["Name", "Tag"]);

        let row = table.children_of(NodeKind::TableRow).next().unwrap();
        let cells: Vec<&str> = row.children.iter().map(|c| c.text.trim()).collect();
        assert_eq!(cells, vec!["Side", "54"]);
    }

    #[test]
    fn test_parse_cell_line_break() {
        let tree = parse("| Values |\n|---|\n| 1=Buy<br>2=Sell |\n");
        let table = &tree.root.children[0];
        let row = table.children_of(NodeKind::TableRow).next().unwrap();
        assert_eq!(row.children[0].text.trim(), "1=Buy\n2=Sell");
    }

    #[test]
    fn test_parse_code_block_ignored() {
        let tree = parse("```\nnot prose\n```\n\nProse.\n");
        assert_eq!(tree.root.children.len(), 1);
        assert_eq!(tree.root.children[0].text, "Prose.");
    }
}
