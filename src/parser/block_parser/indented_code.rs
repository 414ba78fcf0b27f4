//! Indented code blocks.
//!
//! A block of text indented four spaces (or one tab) is treated as verbatim text.
//! The initial (four space or one tab) indentation is not considered part of the
//! verbatim text and is removed in the output.
//!
//! Note: blank lines in the verbatim text need not begin with four spaces.

use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const INDENTED_CODE: &str = "indentedCode";

const CODE_INDENT: usize = 4;

#[derive(Debug)]
struct IndentedCodeState {
    lines: Vec<PhrasingLine>,
    /// Number of leading lines that are not blank.
    last_content_line: usize,
}

#[derive(Debug, Default)]
pub struct IndentedCodeTokenizer;

impl IndentedCodeTokenizer {
    fn strip_indent(line: &PhrasingLine, ctx: &BlockContext<'_>) -> PhrasingLine {
        line.skip_columns(ctx.points(), CODE_INDENT)
    }
}

impl BlockTokenizer for IndentedCodeTokenizer {
    fn name(&self) -> &'static str {
        INDENTED_CODE
    }

    fn priority(&self) -> i32 {
        5
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        // An indented code block can not interrupt a paragraph.
        if ctx.is_interrupting_paragraph()
            || line.count_of_preceding_space < CODE_INDENT
            || line.is_blank(ctx.points())
        {
            return None;
        }
        let content = Self::strip_indent(line, ctx);
        Some(EatOpenerResult {
            token: BlockToken::leaf(
                INDENTED_CODE,
                content.start,
                line.content_end(ctx.points()),
                IndentedCodeState {
                    lines: vec![content],
                    last_content_line: 1,
                },
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
        let points = ctx.points();
        let blank = line.is_blank(points);
        if !blank && line.count_of_preceding_space < CODE_INDENT {
            return ContinuationStatus::NotMatched;
        }

        let content = Self::strip_indent(line, ctx);
        let state = token.state_mut::<IndentedCodeState>();
        state.lines.push(content);
        if !blank {
            state.last_content_line = state.lines.len();
            token.end = line.content_end(points);
        }
        ContinuationStatus::Opening {
            next_index: line.end,
        }
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let state = token.state::<IndentedCodeState>();
        let mut value: String = state.lines[..state.last_content_line]
            .iter()
            .map(|line| line.text(ctx.points()))
            .collect();
        if value.ends_with('\n') {
            value.pop();
        }
        Some(Node::new(NodeValue::Code {
            lang: None,
            meta: None,
            value,
        }))
    }
}
