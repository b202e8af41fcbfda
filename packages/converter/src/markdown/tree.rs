//! Parse tree handed from the Markdown front end to the event source.

/// Kind of a parse tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    /// Heading with its depth (1 for `#`).
    Heading(usize),
    Paragraph,
    List,
    ListItem,
    Table,
    /// Header row of a table; its children are cells.
    TableHeading,
    TableRow,
    Cell,
}

impl NodeKind {
    /// Whether inline text is collected directly into this node.
    #[must_use]
    pub fn holds_text(self) -> bool {
        matches!(
            self,
            Self::Heading(_) | Self::Paragraph | Self::ListItem | Self::Cell
        )
    }
}

/// A node with its raw text and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub text: String,
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Children of the given kind.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// A parsed document; the root node is always [`NodeKind::Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownTree {
    pub root: Node,
}
