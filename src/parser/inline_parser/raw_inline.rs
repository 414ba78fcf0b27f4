//! Raw inline HTML: tags, comments, processing instructions, declarations
//! and CDATA sections, passed through verbatim.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::api::InlineContext;
use crate::parser::block_parser::html_blocks::{closing_tag_pattern, open_tag_pattern};
use crate::parser::chars::is_escaped;
use crate::parser::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer};
use crate::syntax::{Node, NodeValue};

pub const HTML_INLINE: &str = "htmlInline";

static RAW_HTML: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?:{}|{}|<!-->|<!--->|<!--(?s:.*?)-->|<\?(?s:.*?)\?>|<![A-Za-z][^>]*>|<!\[CDATA\[(?s:.*?)\]\]>)",
        open_tag_pattern(),
        closing_tag_pattern()
    );
    Regex::new(&pattern).expect("raw html regex is valid")
});

/// Length in characters of the raw HTML at the start of `text`, if any.
pub(crate) fn match_raw_html(text: &str) -> Option<usize> {
    RAW_HTML.find(text).map(|m| m.as_str().chars().count())
}

#[derive(Debug)]
struct HtmlInlineState {
    value: String,
}

#[derive(Debug, Default)]
pub struct HtmlInlineTokenizer;

impl InlineTokenizer for HtmlInlineTokenizer {
    fn name(&self) -> &'static str {
        HTML_INLINE
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
            if points[i].ch != '<' || is_escaped(points, start, i) {
                return None;
            }
            let len = match_raw_html(&ctx.source(i, end))?;
            Some(Delimiter::new(DelimiterKind::Full, i, i + len, '<'))
        })
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        Some(InlineToken::new(
            HTML_INLINE,
            delimiter.start,
            delimiter.end,
            HtmlInlineState {
                value: ctx.source(delimiter.start, delimiter.end),
            },
        ))
    }

    fn parse_inline(&self, token: &InlineToken, _children: Vec<Node>, _ctx: &InlineContext<'_>) -> Node {
        Node::new(NodeValue::Html {
            value: token.state::<HtmlInlineState>().value.clone(),
        })
    }
}
