//! Emphasis and strong emphasis with `*` and `_`.
//!
//! Delimiter runs are classified by the CommonMark flanking rules, then paired
//! on the shared delimiter stack:
//! - Openers and closers must use the same character.
//! - "Rule of 3s": if either side can both open and close, the original run
//!   lengths may not sum to a multiple of 3 unless both are multiples of 3.
//! - Two characters are consumed from each side when both have at least two
//!   left (strong), otherwise one (emphasis). Leftovers keep pairing.

use crate::parser::api::InlineContext;
use crate::parser::chars::{NodePoint, count_run, is_escaped, is_punctuation, is_unicode_whitespace};
use crate::parser::tokenizer::{
    Delimiter, DelimiterKind, InlineToken, InlineTokenizer, PairOutcome, PairResult,
};
use crate::syntax::{Node, NodeValue};

pub const EMPHASIS: &str = "emphasis";

/// Whether a delimiter run at `[start, end)` can open and close emphasis.
/// The edges of the buffer count as whitespace.
fn analyze_delimiter_run(points: &[NodePoint], start: usize, end: usize, marker: char) -> (bool, bool) {
    let before = start.checked_sub(1).map(|i| points[i].ch);
    let after = points.get(end).map(|p| p.ch);

    let followed_by_whitespace = after.is_none_or(is_unicode_whitespace);
    let followed_by_punctuation = after.is_some_and(is_punctuation);
    let preceded_by_whitespace = before.is_none_or(is_unicode_whitespace);
    let preceded_by_punctuation = before.is_some_and(is_punctuation);

    let left_flanking = !followed_by_whitespace
        && (!followed_by_punctuation || preceded_by_whitespace || preceded_by_punctuation);
    let right_flanking = !preceded_by_whitespace
        && (!preceded_by_punctuation || followed_by_whitespace || followed_by_punctuation);

    if marker == '_' {
        (
            left_flanking && (!right_flanking || preceded_by_punctuation),
            right_flanking && (!left_flanking || followed_by_punctuation),
        )
    } else {
        (left_flanking, right_flanking)
    }
}

/// Map open/close ability to a delimiter role.
pub(crate) fn delimiter_kind(can_open: bool, can_close: bool) -> Option<DelimiterKind> {
    match (can_open, can_close) {
        (true, true) => Some(DelimiterKind::Both),
        (true, false) => Some(DelimiterKind::Opener),
        (false, true) => Some(DelimiterKind::Closer),
        (false, false) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EmphasisState {
    strong: bool,
}

#[derive(Debug, Default)]
pub struct EmphasisTokenizer;

impl InlineTokenizer for EmphasisTokenizer {
    fn name(&self) -> &'static str {
        EMPHASIS
    }

    fn priority(&self) -> i32 {
        20
    }

    fn find_delimiter(
        &self,
        start: usize,
        end: usize,
        ctx: &InlineContext<'_>,
    ) -> Option<Delimiter> {
        let points = ctx.points();
        let mut i = start;
        while i < end {
            let marker = points[i].ch;
            if !matches!(marker, '*' | '_') || is_escaped(points, start, i) {
                i += 1;
                continue;
            }
            let len = count_run(points, i, end, marker);
            let (can_open, can_close) = analyze_delimiter_run(points, i, i + len, marker);
            if let Some(kind) = delimiter_kind(can_open, can_close) {
                return Some(Delimiter::new(kind, i, i + len, marker));
            }
            i += len;
        }
        None
    }

    fn is_delimiter_pair(
        &self,
        opener: &Delimiter,
        closer: &Delimiter,
        _inner: &[InlineToken],
        _ctx: &InlineContext<'_>,
    ) -> PairResult {
        let skip = PairResult::Unpaired {
            opener: true,
            closer: true,
        };
        if opener.marker != closer.marker {
            return skip;
        }
        let either_both = opener.kind == DelimiterKind::Both || closer.kind == DelimiterKind::Both;
        let (o, c) = (opener.original_thickness, closer.original_thickness);
        if either_both && (o + c) % 3 == 0 && !(o % 3 == 0 && c % 3 == 0) {
            return skip;
        }
        PairResult::Paired
    }

    fn process_delimiter_pair(
        &self,
        opener: &Delimiter,
        closer: &Delimiter,
        inner: Vec<InlineToken>,
        _ctx: &InlineContext<'_>,
    ) -> PairOutcome {
        let used = if opener.thickness >= 2 && closer.thickness >= 2 { 2 } else { 1 };
        log::trace!(
            "Emphasis {}..{} uses {} of {}{}",
            opener.end - used,
            closer.start + used,
            used,
            opener.marker,
            closer.marker
        );

        let remaining_opener = (opener.thickness > used).then(|| Delimiter {
            end: opener.end - used,
            thickness: opener.thickness - used,
            ..*opener
        });
        let remaining_closer = (closer.thickness > used).then(|| Delimiter {
            start: closer.start + used,
            thickness: closer.thickness - used,
            ..*closer
        });

        PairOutcome {
            tokens: vec![InlineToken::with_content(
                EMPHASIS,
                opener.end - used,
                closer.start + used,
                opener.end..closer.start,
                inner,
                EmphasisState { strong: used == 2 },
            )],
            remaining_opener,
            remaining_closer,
        }
    }

    fn parse_inline(&self, token: &InlineToken, children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        let value = if token.state::<EmphasisState>().strong {
            NodeValue::Strong
        } else {
            NodeValue::Emphasis
        };
        Node::with_children(value, children)
    }
}
