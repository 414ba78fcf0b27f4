//! Fallback grammar: plain text between every other construct.

use super::escapes;
use crate::parser::api::InlineContext;
use crate::parser::tokenizer::{Delimiter, InlineToken, InlineTokenizer};
use crate::syntax::Node;

pub const TEXT: &str = "text";

/// Drop spaces and tabs before each soft line ending, then decode escapes
/// and character references.
pub(crate) fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut lines = raw.split('\n').peekable();
    while let Some(line) = lines.next() {
        if lines.peek().is_some() {
            out.push_str(line.trim_end_matches([' ', '\t']));
            out.push('\n');
        } else {
            out.push_str(line);
        }
    }
    escapes::decode(&out)
}

#[derive(Debug)]
struct TextState {
    value: String,
}

#[derive(Debug, Default)]
pub struct TextTokenizer;

impl InlineTokenizer for TextTokenizer {
    fn name(&self) -> &'static str {
        TEXT
    }

    fn priority(&self) -> i32 {
        -1
    }

    /// Never scans; gaps are handed over as full delimiters.
    fn find_delimiter(
        &self,
        _start: usize,
        _end: usize,
        _ctx: &InlineContext<'_>,
    ) -> Option<Delimiter> {
        None
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        let value = normalize_text(&ctx.source(delimiter.start, delimiter.end));
        Some(InlineToken::new(TEXT, delimiter.start, delimiter.end, TextState { value }))
    }

    fn parse_inline(&self, token: &InlineToken, _children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        Node::text(token.state::<TextState>().value.clone())
    }
}
