//! Code spans: a backtick run closed by a run of the same length.

use crate::parser::api::InlineContext;
use crate::parser::chars::{count_run, is_escaped};
use crate::parser::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer};
use crate::syntax::{Node, NodeValue};

pub const INLINE_CODE: &str = "inlineCode";

/// Normalize code span content: line endings become spaces, and one space is
/// stripped from both ends when both are present and the content is not all
/// spaces.
pub(crate) fn code_span_value(raw: &str) -> String {
    let value = raw.replace('\n', " ");
    if value.len() >= 2
        && value.starts_with(' ')
        && value.ends_with(' ')
        && !value.chars().all(|c| c == ' ')
    {
        value[1..value.len() - 1].to_string()
    } else {
        value
    }
}

#[derive(Debug)]
struct CodeSpanState {
    value: String,
}

#[derive(Debug, Default)]
pub struct InlineCodeTokenizer;

impl InlineTokenizer for InlineCodeTokenizer {
    fn name(&self) -> &'static str {
        INLINE_CODE
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
        let mut i = start;
        while i < end {
            if points[i].ch != '`' {
                i += 1;
                continue;
            }
            let opening = count_run(points, i, end, '`');
            // An escaped backtick is literal, the rest of its run may still open.
            if is_escaped(points, start, i) {
                i += 1;
                continue;
            }

            let mut j = i + opening;
            while j < end {
                if points[j].ch != '`' {
                    j += 1;
                    continue;
                }
                let closing = count_run(points, j, end, '`');
                if closing == opening {
                    return Some(Delimiter::new(DelimiterKind::Full, i, j + closing, '`'));
                }
                j += closing;
            }
            i += opening;
        }
        None
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        let points = ctx.points();
        let run = count_run(points, delimiter.start, delimiter.end, '`');
        let raw = ctx.source(delimiter.start + run, delimiter.end - run);
        Some(InlineToken::new(
            INLINE_CODE,
            delimiter.start,
            delimiter.end,
            CodeSpanState {
                value: code_span_value(&raw),
            },
        ))
    }

    fn parse_inline(&self, token: &InlineToken, _children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        Node::new(NodeValue::InlineCode {
            value: token.state::<CodeSpanState>().value.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::chars::code_points;
    use crate::parser::registry::IdentifierRegistry;

    fn find(input: &str) -> Option<(usize, usize)> {
        let points = code_points(input);
        let registry = IdentifierRegistry::new();
        let ctx = InlineContext::new(&points, &registry);
        InlineCodeTokenizer
            .find_delimiter(0, points.len(), &ctx)
            .map(|d| (d.start, d.end))
    }

    #[test]
    fn test_simple_code_span() {
        assert_eq!(find("a `b` c"), Some((2, 5)));
    }

    #[test]
    fn test_run_lengths_must_match() {
        assert_eq!(find("``a`b``"), Some((0, 7)));
        assert_eq!(find("`a``"), None);
        assert_eq!(find("```a`` `b`"), Some((7, 10)));
    }

    #[test]
    fn test_escaped_backtick_does_not_open() {
        assert_eq!(find("\\`a`"), None);
        assert_eq!(find("\\``a`"), Some((2, 5)));
    }

    #[test]
    fn test_value_normalization() {
        assert_eq!(code_span_value(" a "), "a");
        assert_eq!(code_span_value("  a  "), " a ");
        assert_eq!(code_span_value("   "), "   ");
        assert_eq!(code_span_value(" a"), " a");
        assert_eq!(code_span_value("a\nb"), "a b");
        assert_eq!(code_span_value(" `` "), "``");
    }
}
