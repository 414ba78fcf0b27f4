//! GFM strikethrough: `~text~` and `~~text~~`.
//!
//! Runs of one or two tildes flank like `*`. An opener only pairs with a
//! closer of the same length; longer runs are literal.

use super::emphasis::delimiter_kind;
use crate::parser::api::InlineContext;
use crate::parser::chars::{count_run, is_escaped, is_punctuation, is_unicode_whitespace};
use crate::parser::tokenizer::{
    Delimiter, InlineToken, InlineTokenizer, PairOutcome, PairResult,
};
use crate::syntax::{Node, NodeValue};

pub const DELETE: &str = "delete";

#[derive(Debug, Default)]
pub struct DeleteTokenizer;

impl InlineTokenizer for DeleteTokenizer {
    fn name(&self) -> &'static str {
        DELETE
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
            if points[i].ch != '~' || is_escaped(points, start, i) {
                i += 1;
                continue;
            }
            let len = count_run(points, i, end, '~');
            if len <= 2 {
                let before = i.checked_sub(1).map(|j| points[j].ch);
                let after = points.get(i + len).map(|p| p.ch);
                let ws_before = before.is_none_or(is_unicode_whitespace);
                let ws_after = after.is_none_or(is_unicode_whitespace);
                let punct_before = before.is_some_and(is_punctuation);
                let punct_after = after.is_some_and(is_punctuation);
                let can_open = !ws_after && (!punct_after || ws_before || punct_before);
                let can_close = !ws_before && (!punct_before || ws_after || punct_after);
                if let Some(kind) = delimiter_kind(can_open, can_close) {
                    return Some(Delimiter::new(kind, i, i + len, '~'));
                }
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
        if opener.thickness == closer.thickness {
            PairResult::Paired
        } else {
            PairResult::Unpaired {
                opener: true,
                closer: true,
            }
        }
    }

    fn process_delimiter_pair(
        &self,
        opener: &Delimiter,
        closer: &Delimiter,
        inner: Vec<InlineToken>,
        _ctx: &InlineContext<'_>,
    ) -> PairOutcome {
        PairOutcome {
            tokens: vec![InlineToken::with_content(
                DELETE,
                opener.start,
                closer.end,
                opener.end..closer.start,
                inner,
                (),
            )],
            remaining_opener: None,
            remaining_closer: None,
        }
    }

    fn parse_inline(&self, _token: &InlineToken, children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        Node::with_children(NodeValue::Delete, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::chars::code_points;
    use crate::parser::registry::IdentifierRegistry;
    use crate::parser::tokenizer::DelimiterKind;

    fn find(input: &str) -> Option<(DelimiterKind, usize, usize)> {
        let points = code_points(input);
        let registry = IdentifierRegistry::new();
        let ctx = InlineContext::new(&points, &registry);
        DeleteTokenizer
            .find_delimiter(0, points.len(), &ctx)
            .map(|d| (d.kind, d.start, d.end))
    }

    #[test]
    fn test_single_and_double_tildes() {
        assert_eq!(find("~~a"), Some((DelimiterKind::Opener, 0, 2)));
        assert_eq!(find("a~ b"), Some((DelimiterKind::Closer, 1, 2)));
    }

    #[test]
    fn test_long_runs_are_literal() {
        assert_eq!(find("~~~a~~~"), None);
        assert_eq!(find("~~~a ~b"), Some((DelimiterKind::Opener, 5, 6)));
    }

    #[test]
    fn test_unequal_runs_do_not_pair() {
        let points = code_points("");
        let registry = IdentifierRegistry::new();
        let ctx = InlineContext::new(&points, &registry);
        let opener = Delimiter::new(DelimiterKind::Opener, 0, 2, '~');
        let closer = Delimiter::new(DelimiterKind::Closer, 3, 4, '~');
        assert!(matches!(
            DeleteTokenizer.is_delimiter_pair(&opener, &closer, &[], &ctx),
            PairResult::Unpaired { .. }
        ));
    }
}
