//! Abstract syntax tree produced by the parser.
//!
//! Node shapes follow mdast: every node serializes as an object with a
//! `type` tag, the variant's own fields, an optional `children` array and an
//! optional `position`.

use serde::Serialize;

/// A location in the source text.
///
/// `line` and `column` are 1-based, `offset` is the 0-based code-point index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Half-open source span of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

/// Column alignment of a GFM table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlignKind {
    Left,
    Right,
    Center,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeValue {
    Root,

    // Flow content
    Paragraph,
    Heading {
        depth: u8,
    },
    ThematicBreak,
    Blockquote,
    List {
        ordered: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        start: Option<u64>,
        spread: bool,
        marker: char,
    },
    ListItem {
        spread: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    Code {
        #[serde(skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        meta: Option<String>,
        value: String,
    },
    Html {
        value: String,
    },
    Definition {
        identifier: String,
        label: String,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    FootnoteDefinition {
        identifier: String,
        label: String,
    },
    Table {
        align: Vec<AlignKind>,
    },
    TableRow,
    TableCell,

    // Phrasing content
    Text {
        value: String,
    },
    Emphasis,
    Strong,
    Delete,
    InlineCode {
        value: String,
    },
    Break,
    Link {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Image {
        url: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    FootnoteReference {
        identifier: String,
        label: String,
    },

    /// Escape hatch for externally registered grammars.
    Custom {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub value: NodeValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Node {
    pub fn new(value: NodeValue) -> Self {
        Self {
            value,
            children: Vec::new(),
            position: None,
        }
    }

    pub fn with_children(value: NodeValue, children: Vec<Node>) -> Self {
        Self {
            value,
            children,
            position: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeValue::Text {
            value: value.into(),
        })
    }

    /// The mdast `type` tag of this node.
    pub fn kind(&self) -> &'static str {
        match &self.value {
            NodeValue::Root => "root",
            NodeValue::Paragraph => "paragraph",
            NodeValue::Heading { .. } => "heading",
            NodeValue::ThematicBreak => "thematicBreak",
            NodeValue::Blockquote => "blockquote",
            NodeValue::List { .. } => "list",
            NodeValue::ListItem { .. } => "listItem",
            NodeValue::Code { .. } => "code",
            NodeValue::Html { .. } => "html",
            NodeValue::Definition { .. } => "definition",
            NodeValue::FootnoteDefinition { .. } => "footnoteDefinition",
            NodeValue::Table { .. } => "table",
            NodeValue::TableRow => "tableRow",
            NodeValue::TableCell => "tableCell",
            NodeValue::Text { .. } => "text",
            NodeValue::Emphasis => "emphasis",
            NodeValue::Strong => "strong",
            NodeValue::Delete => "delete",
            NodeValue::InlineCode { .. } => "inlineCode",
            NodeValue::Break => "break",
            NodeValue::Link { .. } => "link",
            NodeValue::Image { .. } => "image",
            NodeValue::FootnoteReference { .. } => "footnoteReference",
            NodeValue::Custom { .. } => "custom",
        }
    }

    /// Concatenated text of all descendant `text` and `inlineCode` nodes.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        collect_plain_text(self, &mut out);
        out
    }

    /// Depth-first pre-order iterator over this node and its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Node> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Drop position metadata from this subtree.
    pub fn strip_positions(&mut self) {
        self.position = None;
        for child in &mut self.children {
            child.strip_positions();
        }
    }
}

fn collect_plain_text(node: &Node, out: &mut String) {
    match &node.value {
        NodeValue::Text { value } | NodeValue::InlineCode { value } => out.push_str(value),
        NodeValue::Image { alt, .. } => out.push_str(alt),
        NodeValue::Break => out.push('\n'),
        _ => {
            for child in &node.children {
                collect_plain_text(child, out);
            }
        }
    }
}
