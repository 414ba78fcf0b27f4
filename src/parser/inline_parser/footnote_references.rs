//! Footnote references: `[^label]` naming a defined footnote.

use crate::parser::api::InlineContext;
use crate::parser::chars::{is_escaped, is_whitespace};
use crate::parser::registry::normalize_identifier;
use crate::parser::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer};
use crate::syntax::{Node, NodeValue};

pub const FOOTNOTE_REFERENCE: &str = "footnoteReference";

#[derive(Debug)]
struct FootnoteReferenceState {
    label: String,
}

#[derive(Debug, Default)]
pub struct FootnoteReferenceTokenizer;

impl FootnoteReferenceTokenizer {
    /// End of the `]` closing a `[^` opened at `i`, if the label is plain.
    fn label_end(i: usize, end: usize, ctx: &InlineContext<'_>) -> Option<usize> {
        let points = ctx.points();
        if i + 2 >= end || points[i + 1].ch != '^' {
            return None;
        }
        let mut j = i + 2;
        while j < end {
            match points[j].ch {
                ']' if j > i + 2 => return Some(j + 1),
                c if c == '[' || c == ']' || is_whitespace(c) => return None,
                _ => j += 1,
            }
        }
        None
    }
}

impl InlineTokenizer for FootnoteReferenceTokenizer {
    fn name(&self) -> &'static str {
        FOOTNOTE_REFERENCE
    }

    fn priority(&self) -> i32 {
        40
    }

    fn find_delimiter(
        &self,
        start: usize,
        end: usize,
        ctx: &InlineContext<'_>,
    ) -> Option<Delimiter> {
        let points = ctx.points();
        (start..end).find_map(|i| {
            if points[i].ch != '[' || is_escaped(points, start, i) {
                return None;
            }
            let label_end = Self::label_end(i, end, ctx)?;
            let label = ctx.source(i + 2, label_end - 1);
            ctx.registry()
                .has_footnote(&label)
                .then(|| Delimiter::new(DelimiterKind::Full, i, label_end, '^'))
        })
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        Some(InlineToken::new(
            FOOTNOTE_REFERENCE,
            delimiter.start,
            delimiter.end,
            FootnoteReferenceState {
                label: ctx.source(delimiter.start + 2, delimiter.end - 1),
            },
        ))
    }

    fn parse_inline(&self, token: &InlineToken, _children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        let label = &token.state::<FootnoteReferenceState>().label;
        Node::new(NodeValue::FootnoteReference {
            identifier: normalize_identifier(label),
            label: label.clone(),
        })
    }
}
