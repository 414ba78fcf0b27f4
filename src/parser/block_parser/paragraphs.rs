//! Paragraphs: the block fallback.
//!
//! A paragraph collects raw lines until a blank line or an interrupting
//! block start. Other grammars (setext headings, tables) take over its
//! lines through [`ParagraphState`].

use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::{NodePoint, trim_end};
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const PARAGRAPH: &str = "paragraph";

#[derive(Debug, Clone, Default)]
pub struct ParagraphState {
    pub lines: Vec<PhrasingLine>,
}

impl ParagraphState {
    /// Index just past the last non-whitespace point of the paragraph.
    pub fn content_end(&self, points: &[NodePoint]) -> Option<usize> {
        self.lines
            .last()
            .map(|line| trim_end(points, line.first_nonwhitespace, line.end))
    }
}

#[derive(Debug, Default)]
pub struct ParagraphTokenizer;

impl ParagraphTokenizer {
    fn take_line(&self, line: &PhrasingLine, token: &mut BlockToken, ctx: &BlockContext<'_>) -> usize {
        token.state_mut::<ParagraphState>().lines.push(*line);
        token.end = trim_end(ctx.points(), line.first_nonwhitespace, line.end);
        line.end
    }
}

impl BlockTokenizer for ParagraphTokenizer {
    fn name(&self) -> &'static str {
        PARAGRAPH
    }

    fn priority(&self) -> i32 {
        -1
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        let points = ctx.points();
        if line.is_blank(points) {
            return None;
        }
        let start = line.first_nonwhitespace;
        let end = trim_end(points, start, line.end);
        Some(EatOpenerResult {
            token: BlockToken::leaf(
                PARAGRAPH,
                start,
                end,
                ParagraphState { lines: vec![*line] },
            ),
            next_index: line.end,
            saturated: false,
        })
    }

    fn eat_continuation_text(
        &self,
        line: &PhrasingLine,
        token: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> ContinuationStatus {
        if line.is_blank(ctx.points()) {
            return ContinuationStatus::NotMatched;
        }
        ContinuationStatus::Opening {
            next_index: self.take_line(line, token, ctx),
        }
    }

    fn supports_lazy_continuation(&self) -> bool {
        true
    }

    fn eat_lazy_continuation_text(
        &self,
        line: &PhrasingLine,
        token: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<usize> {
        if line.is_blank(ctx.points()) {
            return None;
        }
        Some(self.take_line(line, token, ctx))
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let state = token.state::<ParagraphState>();
        let children = ctx.parse_lines(&state.lines);
        if children.is_empty() {
            return None;
        }
        Some(Node::with_children(NodeValue::Paragraph, children))
    }
}
