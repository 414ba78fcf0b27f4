//! Block quotes.

use super::interrupt_with_opener;
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::NodePoint;
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatInterruptResult, EatOpenerResult,
    ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const BLOCKQUOTE: &str = "blockquote";

/// Try to parse a `>` marker at the cursor of `line`. Returns the index just
/// past the marker.
pub(crate) fn try_parse_blockquote_marker(points: &[NodePoint], line: &PhrasingLine) -> Option<usize> {
    if line.count_of_preceding_space > 3 {
        return None;
    }
    let i = line.first_nonwhitespace;
    (i < line.end && points[i].ch == '>').then_some(i + 1)
}

/// Consume the marker and the one optional column of space after it.
fn eat_marker(line: &PhrasingLine, ctx: &mut BlockContext<'_>) -> Option<usize> {
    let points = ctx.points();
    let after = try_parse_blockquote_marker(points, line)?;
    Some(ctx.skip_columns(&line.advance(points, after), 1))
}

#[derive(Debug, Default)]
pub struct BlockquoteTokenizer;

impl BlockTokenizer for BlockquoteTokenizer {
    fn name(&self) -> &'static str {
        BLOCKQUOTE
    }

    fn priority(&self) -> i32 {
        70
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        let marker = line.first_nonwhitespace;
        let next_index = eat_marker(line, ctx)?;
        Some(EatOpenerResult {
            token: BlockToken::container(BLOCKQUOTE, marker, marker + 1, ()),
            next_index,
            saturated: false,
        })
    }

    fn eat_and_interrupt_previous_sibling(
        &self,
        line: &PhrasingLine,
        previous: &mut BlockToken,
        parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatInterruptResult> {
        interrupt_with_opener(self, line, previous, parent, ctx)
    }

    fn eat_continuation_text(
        &self,
        line: &PhrasingLine,
        _token: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> ContinuationStatus {
        match eat_marker(line, ctx) {
            Some(next_index) => ContinuationStatus::Opening { next_index },
            None => ContinuationStatus::NotMatched,
        }
    }

    fn parse_block(
        &self,
        _token: &BlockToken,
        children: Vec<Node>,
        _ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        Some(Node::with_children(NodeValue::Blockquote, children))
    }
}
