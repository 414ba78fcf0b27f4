//! Capability API handed to grammar hooks.

use super::chars::{NodePoint, collect_string, is_whitespace};
use super::inline_parser::InlinePipeline;
use super::lines::{PhrasingLine, virtual_column};
use super::registry::IdentifierRegistry;
use crate::syntax::Node;

/// Context for the block matching phase.
pub struct BlockContext<'a> {
    points: &'a [NodePoint],
    registry: &'a mut IdentifierRegistry,
    interrupting: bool,
    /// Index and column of a cursor left inside a split tab.
    split_tab: Option<(usize, usize)>,
}

impl<'a> BlockContext<'a> {
    pub fn new(points: &'a [NodePoint], registry: &'a mut IdentifierRegistry) -> Self {
        Self {
            points,
            registry,
            interrupting: false,
            split_tab: None,
        }
    }

    pub fn points(&self) -> &'a [NodePoint] {
        self.points
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        self.registry
    }

    pub fn registry_mut(&mut self) -> &mut IdentifierRegistry {
        self.registry
    }

    /// True while the matcher asks for an opener that would interrupt an
    /// open paragraph (directly or through lazy continuation).
    pub fn is_interrupting_paragraph(&self) -> bool {
        self.interrupting
    }

    pub(crate) fn set_interrupting(&mut self, interrupting: bool) {
        self.interrupting = interrupting;
    }

    pub fn source(&self, start: usize, end: usize) -> String {
        collect_string(self.points, start, end)
    }

    /// Consume up to `columns` columns of leading whitespace of `line` and
    /// return the index to continue from. When a tab is split, the column
    /// inside it is remembered for the next hook.
    pub fn skip_columns(&mut self, line: &PhrasingLine, columns: usize) -> usize {
        let rest = line.skip_columns(self.points, columns);
        self.split_tab = (rest.column > virtual_column(self.points, rest.line_start, rest.start))
            .then_some((rest.start, rest.column));
        rest.start
    }

    /// `line` with its cursor at `index`, inside a split tab if one was left there.
    pub(crate) fn line_at(&self, line: &PhrasingLine, index: usize) -> PhrasingLine {
        match self.split_tab {
            Some((at, column)) if at == index => {
                PhrasingLine::at_column(self.points, line.line_start, index, line.end, column)
            }
            _ => line.advance(self.points, index),
        }
    }

    pub(crate) fn reset_split_tab(&mut self) {
        self.split_tab = None;
    }
}

/// Raw, not yet inline-parsed lines of a leaf block, flattened into their
/// own code-point buffer. Points keep their original source locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhrasingContent {
    pub points: Vec<NodePoint>,
}

impl PhrasingContent {
    /// Join lines, dropping each line's leading whitespace and the trailing
    /// whitespace of the whole content. Returns `None` when nothing is left.
    pub fn from_lines(points: &[NodePoint], lines: &[PhrasingLine]) -> Option<Self> {
        let mut merged = Vec::new();
        for line in lines {
            merged.extend_from_slice(&points[line.first_nonwhitespace..line.end]);
        }
        while merged.last().is_some_and(|p| is_whitespace(p.ch)) {
            merged.pop();
        }
        if merged.is_empty() {
            None
        } else {
            Some(Self { points: merged })
        }
    }

    pub fn to_text(&self) -> String {
        self.points.iter().map(|p| p.ch).collect()
    }
}

/// Context for block reduction.
pub struct ParseContext<'a> {
    points: &'a [NodePoint],
    registry: &'a IdentifierRegistry,
    inline: &'a InlinePipeline<'a>,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        points: &'a [NodePoint],
        registry: &'a IdentifierRegistry,
        inline: &'a InlinePipeline<'a>,
    ) -> Self {
        Self {
            points,
            registry,
            inline,
        }
    }

    pub fn points(&self) -> &'a [NodePoint] {
        self.points
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        self.registry
    }

    pub fn source(&self, start: usize, end: usize) -> String {
        collect_string(self.points, start, end)
    }

    pub fn build_phrasing_content(&self, lines: &[PhrasingLine]) -> Option<PhrasingContent> {
        PhrasingContent::from_lines(self.points, lines)
    }

    /// Run the inline pipeline over phrasing content.
    pub fn parse_phrasing_content(&self, content: &PhrasingContent) -> Vec<Node> {
        self.inline.parse(&content.points, self.registry)
    }

    /// Build and parse in one step; empty content yields no children.
    pub fn parse_lines(&self, lines: &[PhrasingLine]) -> Vec<Node> {
        self.build_phrasing_content(lines)
            .map(|content| self.parse_phrasing_content(&content))
            .unwrap_or_default()
    }

    /// Parse `points[start..end]` of a single line as phrasing content.
    pub fn parse_range(&self, start: usize, end: usize) -> Vec<Node> {
        if start >= end {
            return Vec::new();
        }
        let content = PhrasingContent {
            points: self.points[start..end].to_vec(),
        };
        self.parse_phrasing_content(&content)
    }
}

/// Context for the inline phase of one phrasing-content leaf.
pub struct InlineContext<'a> {
    points: &'a [NodePoint],
    registry: &'a IdentifierRegistry,
    /// Names of the tokens whose content is being scanned, outermost first.
    enclosing: Vec<&'static str>,
}

impl<'a> InlineContext<'a> {
    pub fn new(points: &'a [NodePoint], registry: &'a IdentifierRegistry) -> Self {
        Self {
            points,
            registry,
            enclosing: Vec::new(),
        }
    }

    /// The context for scanning the content of a token produced by `tokenizer`.
    pub fn nested(&self, tokenizer: &'static str) -> InlineContext<'a> {
        let mut enclosing = self.enclosing.clone();
        enclosing.push(tokenizer);
        InlineContext {
            points: self.points,
            registry: self.registry,
            enclosing,
        }
    }

    /// Whether the scan runs inside the content of a `tokenizer` token.
    pub fn is_inside(&self, tokenizer: &str) -> bool {
        self.enclosing.contains(&tokenizer)
    }

    pub fn points(&self) -> &'a [NodePoint] {
        self.points
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        self.registry
    }

    pub fn source(&self, start: usize, end: usize) -> String {
        collect_string(self.points, start, end)
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.points.get(index).map(|p| p.ch)
    }
}
