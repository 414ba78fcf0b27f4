//! Hard line breaks: two or more spaces, or a backslash, before a line ending.

use crate::parser::api::InlineContext;
use crate::parser::chars::is_escaped;
use crate::parser::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer};
use crate::syntax::{Node, NodeValue};

pub const BREAK: &str = "break";

#[derive(Debug, Default)]
pub struct BreakTokenizer;

impl InlineTokenizer for BreakTokenizer {
    fn name(&self) -> &'static str {
        BREAK
    }

    fn priority(&self) -> i32 {
        10
    }

    fn find_delimiter(
        &self,
        start: usize,
        end: usize,
        ctx: &InlineContext<'_>,
    ) -> Option<Delimiter> {
        let points = ctx.points();
        (start..end).find_map(|i| {
            if points[i].ch != '\n' {
                return None;
            }
            let mut j = i;
            while j > start && points[j - 1].ch == ' ' {
                j -= 1;
            }
            if i - j >= 2 {
                return Some(Delimiter::new(DelimiterKind::Full, j, i + 1, ' '));
            }
            (i > start && points[i - 1].ch == '\\' && !is_escaped(points, start, i - 1))
                .then(|| Delimiter::new(DelimiterKind::Full, i - 1, i + 1, '\\'))
        })
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        _ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        Some(InlineToken::new(BREAK, delimiter.start, delimiter.end, ()))
    }

    fn parse_inline(&self, _token: &InlineToken, _children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        Node::new(NodeValue::Break)
    }
}
