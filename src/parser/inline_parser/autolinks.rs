//! Autolinks: `<scheme:...>` and `<user@host>`.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::api::InlineContext;
use crate::parser::chars::{end_point, is_escaped, start_point};
use crate::parser::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer};
use crate::syntax::{Node, NodeValue, Position};

pub const AUTOLINK: &str = "autolink";

static URI_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z][A-Za-z0-9+.\-]{1,31}:[^\x00-\x20<>]*)>")
        .expect("uri autolink regex is valid")
});

static EMAIL_AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^<([A-Za-z0-9.!#$%&'*+/=?^_`{|}~\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?)*)>",
    )
    .expect("email autolink regex is valid")
});

/// Longest run that can hold an angle-bracket autolink.
const MAX_ANGLE_LEN: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AutolinkState {
    url: String,
    text_start: usize,
    text_end: usize,
}

#[derive(Debug, Default)]
pub struct AutolinkTokenizer;

impl AutolinkTokenizer {
    fn angle_autolink(&self, i: usize, end: usize, ctx: &InlineContext<'_>) -> Option<Delimiter> {
        let points = ctx.points();
        let close = (i + 1..end.min(i + MAX_ANGLE_LEN))
            .find(|&j| matches!(points[j].ch, '>' | '<'))?;
        if points[close].ch != '>' {
            return None;
        }
        let candidate = ctx.source(i, close + 1);
        (URI_AUTOLINK.is_match(&candidate) || EMAIL_AUTOLINK.is_match(&candidate))
            .then(|| Delimiter::new(DelimiterKind::Full, i, close + 1, '<'))
    }
}

impl InlineTokenizer for AutolinkTokenizer {
    fn name(&self) -> &'static str {
        AUTOLINK
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
            self.angle_autolink(i, end, ctx)
        })
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        let (text_start, text_end) = (delimiter.start + 1, delimiter.end - 1);
        let text = ctx.source(text_start, text_end);
        let url = if EMAIL_AUTOLINK.is_match(&ctx.source(delimiter.start, delimiter.end)) {
            format!("mailto:{}", text)
        } else {
            text
        };
        Some(InlineToken::new(
            AUTOLINK,
            delimiter.start,
            delimiter.end,
            AutolinkState {
                url,
                text_start,
                text_end,
            },
        ))
    }

    fn parse_inline(
        &self,
        token: &InlineToken,
        _children: Vec<Node>,
        ctx: &InlineContext<'_>,
    ) -> Node {
        let state = token.state::<AutolinkState>();
        link_with_text(&state.url, state.text_start, state.text_end, ctx)
    }
}

/// A title-less link whose only child is the source text in `[start, end)`.
pub(crate) fn link_with_text(url: &str, start: usize, end: usize, ctx: &InlineContext<'_>) -> Node {
    let points = ctx.points();
    let mut text = Node::text(ctx.source(start, end));
    text.position = Some(Position {
        start: start_point(points, start),
        end: end_point(points, end),
    });
    Node::with_children(
        NodeValue::Link {
            url: url.to_string(),
            title: None,
        },
        vec![text],
    )
}
