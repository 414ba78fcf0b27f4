//! Setext headings: a paragraph underlined with `=` or `-`.

use super::paragraphs::{PARAGRAPH, ParagraphState};
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::trim_end;
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, EatInterruptResult, EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const SETEXT_HEADING: &str = "setextHeading";

/// Try to parse a setext underline, returns the heading level.
pub(crate) fn try_parse_setext_underline(line: &str) -> Option<u8> {
    let trimmed = line.trim_end();
    let marker = trimmed.chars().next()?;
    let level = match marker {
        '=' => 1,
        '-' => 2,
        _ => return None,
    };
    trimmed.chars().all(|c| c == marker).then_some(level)
}

#[derive(Debug)]
struct SetextState {
    depth: u8,
    lines: Vec<PhrasingLine>,
}

#[derive(Debug, Default)]
pub struct SetextHeadingTokenizer;

impl BlockTokenizer for SetextHeadingTokenizer {
    fn name(&self) -> &'static str {
        SETEXT_HEADING
    }

    fn priority(&self) -> i32 {
        90
    }

    /// Setext headings only ever start by taking over a paragraph.
    fn eat_opener(
        &self,
        _line: &PhrasingLine,
        _parent: ParentInfo,
        _ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        None
    }

    fn eat_and_interrupt_previous_sibling(
        &self,
        line: &PhrasingLine,
        previous: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatInterruptResult> {
        if previous.tokenizer != PARAGRAPH || line.count_of_preceding_space > 3 {
            return None;
        }
        let depth = try_parse_setext_underline(&ctx.source(line.first_nonwhitespace, line.end))?;
        let lines = previous.state::<ParagraphState>().lines.clone();
        let end = trim_end(ctx.points(), line.first_nonwhitespace, line.end);

        Some(EatInterruptResult {
            token: BlockToken::leaf(SETEXT_HEADING, previous.start, end, SetextState { depth, lines }),
            next_index: line.end,
            saturated: true,
            keep_previous: false,
        })
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let state = token.state::<SetextState>();
        Some(Node::with_children(
            NodeValue::Heading { depth: state.depth },
            ctx.parse_lines(&state.lines),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block_parser::tests::helpers::{block_kinds, parse_plain};

    #[test]
    fn test_underlines() {
        assert_eq!(try_parse_setext_underline("==="), Some(1));
        assert_eq!(try_parse_setext_underline("-  \n"), Some(2));
        assert_eq!(try_parse_setext_underline("= ="), None);
        assert_eq!(try_parse_setext_underline("--a"), None);
    }

    #[test]
    fn test_multiline_heading() {
        let root = parse_plain("Foo\nbar\n===\n");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].value, NodeValue::Heading { depth: 1 });
        assert_eq!(root.children[0].to_plain_text(), "Foo\nbar");
    }

    #[test]
    fn test_dash_underline_beats_thematic_break() {
        assert_eq!(block_kinds("Foo\n---\n"), vec!["heading"]);
    }

    #[test]
    fn test_underline_without_paragraph_is_not_heading() {
        assert_eq!(block_kinds("===\n"), vec!["paragraph"]);
        assert_eq!(block_kinds("\n---\n"), vec!["thematicBreak"]);
    }

    #[test]
    fn test_lazy_underline_stays_paragraph_text() {
        let root = parse_plain("> foo\n===\n");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].to_plain_text(), "foo\n===");
    }
}
