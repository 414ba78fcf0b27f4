//! ATX headings.

use super::interrupt_with_opener;
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::{NodePoint, is_space_or_tab, trim_end};
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, EatInterruptResult, EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const ATX_HEADING: &str = "atxHeading";

/// Try to parse an ATX heading from content, returns heading level (1-6) if found.
pub(crate) fn try_parse_atx_heading(content: &str) -> Option<usize> {
    let trimmed = content.trim_start_matches([' ', '\t']);

    // Leading spaces (max 3)
    if content.len() - trimmed.len() > 3 {
        return None;
    }

    let hash_count = trimmed.chars().take_while(|&c| c == '#').count();
    if hash_count == 0 || hash_count > 6 {
        return None;
    }

    // After hashes: end of line, space, or tab
    let after_hashes = &trimmed[hash_count..];
    if !after_hashes.is_empty() && !after_hashes.starts_with([' ', '\t', '\n']) {
        return None;
    }

    Some(hash_count)
}

/// Content range of a heading line once the opening and optional closing
/// sequence of `#` are removed.
fn heading_content(points: &[NodePoint], after_hashes: usize, end: usize) -> (usize, usize) {
    let mut start = after_hashes;
    while start < end && is_space_or_tab(points[start].ch) {
        start += 1;
    }
    let mut stop = trim_end(points, start, end);

    let mut hashes = stop;
    while hashes > start && points[hashes - 1].ch == '#' {
        hashes -= 1;
    }
    if hashes < stop && (hashes == start || is_space_or_tab(points[hashes - 1].ch)) {
        stop = trim_end(points, start, hashes);
    }
    (start, stop)
}

#[derive(Debug, Clone, Copy)]
struct HeadingState {
    depth: u8,
    content_start: usize,
    content_end: usize,
}

#[derive(Debug, Default)]
pub struct AtxHeadingTokenizer;

impl BlockTokenizer for AtxHeadingTokenizer {
    fn name(&self) -> &'static str {
        ATX_HEADING
    }

    fn priority(&self) -> i32 {
        50
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        if line.count_of_preceding_space > 3 {
            return None;
        }
        let points = ctx.points();
        let level = try_parse_atx_heading(&ctx.source(line.first_nonwhitespace, line.end))?;
        let (content_start, content_end) =
            heading_content(points, line.first_nonwhitespace + level, line.end);
        let end = trim_end(points, line.first_nonwhitespace, line.end);

        log::trace!("ATX heading level {}", level);
        Some(EatOpenerResult {
            token: BlockToken::leaf(
                ATX_HEADING,
                line.first_nonwhitespace,
                end,
                HeadingState {
                    depth: level as u8,
                    content_start,
                    content_end,
                },
            ),
            next_index: line.end,
            saturated: true,
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

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let state = token.state::<HeadingState>();
        let children = ctx.parse_range(state.content_start, state.content_end);
        Some(Node::with_children(
            NodeValue::Heading { depth: state.depth },
            children,
        ))
    }
}
