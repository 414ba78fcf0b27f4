//! GFM literal autolinks: `www.` and `http(s)://` URLs and bare email
//! addresses, recognized without angle brackets.
//!
//! Runs after links so that link destinations are already claimed, and
//! never fires inside link text.

use std::sync::LazyLock;

use regex::Regex;

use super::autolinks::link_with_text;
use super::links::LINK;
use crate::parser::api::InlineContext;
use crate::parser::chars::{NodePoint, is_unicode_whitespace};
use crate::parser::tokenizer::{Delimiter, DelimiterKind, InlineToken, InlineTokenizer};
use crate::syntax::Node;

pub const LITERAL_AUTOLINK: &str = "literalAutolink";

static LITERAL_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.+\-_]+@[A-Za-z0-9\-_]+(?:\.[A-Za-z0-9\-_]+)+")
        .expect("literal email regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct LiteralAutolinkState {
    url: String,
}

fn is_email_local(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-' | '_')
}

/// Characters a literal autolink may follow.
fn is_literal_boundary(c: char) -> bool {
    is_unicode_whitespace(c) || matches!(c, '*' | '_' | '~' | '(')
}

/// Whether `domain` is a valid GFM domain: alphanumeric, `-` or `_` segments
/// separated by periods, with no underscore in the last two segments.
fn is_valid_domain(domain: &str, require_period: bool) -> bool {
    let segments: Vec<&str> = domain.split('.').collect();
    if segments.iter().any(|s| {
        s.is_empty()
            || !s
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
    }) {
        return false;
    }
    if require_period && segments.len() < 2 {
        return false;
    }
    segments.iter().rev().take(2).all(|s| !s.contains('_'))
}

/// Trim trailing punctuation, unbalanced closing parens and a trailing
/// entity reference off a literal autolink ending at `end`.
fn trim_literal_end(points: &[NodePoint], start: usize, mut end: usize) -> usize {
    loop {
        let Some(last) = end.checked_sub(1).filter(|&i| i > start).map(|i| points[i].ch) else {
            return end;
        };
        match last {
            '?' | '!' | '.' | ',' | ':' | '*' | '_' | '~' | '\'' | '"' => end -= 1,
            ')' => {
                let (open, close) = points[start..end].iter().fold((0, 0), |(o, c), p| match p.ch {
                    '(' => (o + 1, c),
                    ')' => (o, c + 1),
                    _ => (o, c),
                });
                if close > open {
                    end -= 1;
                } else {
                    return end;
                }
            }
            ';' => {
                let mut i = end - 1;
                while i > start && points[i - 1].ch.is_ascii_alphanumeric() {
                    i -= 1;
                }
                if i > start && i < end - 1 && points[i - 1].ch == '&' {
                    end = i - 1;
                } else {
                    return end;
                }
            }
            _ => return end,
        }
    }
}

/// A `www.` or `http(s)://` autolink starting at `i`.
fn literal_url(i: usize, end: usize, ctx: &InlineContext<'_>) -> Option<Delimiter> {
    let points = ctx.points();
    if i > 0 && !is_literal_boundary(points[i - 1].ch) {
        return None;
    }
    let head: String = points[i..end.min(i + 8)]
        .iter()
        .map(|p| p.ch.to_ascii_lowercase())
        .collect();
    let domain_start = if head.starts_with("www.") {
        i
    } else if head.starts_with("https://") {
        i + 8
    } else if head.starts_with("http://") {
        i + 7
    } else {
        return None;
    };

    let mut stop = domain_start;
    while stop < end && !is_unicode_whitespace(points[stop].ch) && points[stop].ch != '<' {
        stop += 1;
    }
    let stop = trim_literal_end(points, i, stop);
    let domain_end = (domain_start..stop)
        .find(|&j| matches!(points[j].ch, '/' | '?' | '#'))
        .unwrap_or(stop);
    let domain = ctx.source(domain_start, domain_end);
    if !is_valid_domain(&domain, domain_start == i) {
        return None;
    }
    Some(Delimiter::new(DelimiterKind::Full, i, stop, 'w'))
}

/// A bare email address whose local part starts at `i`.
fn literal_email(i: usize, end: usize, ctx: &InlineContext<'_>) -> Option<Delimiter> {
    let points = ctx.points();
    if i > 0 && is_email_local(points[i - 1].ch) {
        return None;
    }
    let mut at = i;
    while at < end && is_email_local(points[at].ch) {
        at += 1;
    }
    if at == i || at >= end || points[at].ch != '@' {
        return None;
    }
    let candidate = ctx.source(i, end);
    let matched = LITERAL_EMAIL.find(&candidate)?;
    let mut stop = i + candidate[..matched.end()].chars().count();
    if points[stop - 1].ch == '.' {
        stop -= 1;
    }
    if matches!(points[stop - 1].ch, '-' | '_') {
        return None;
    }
    Some(Delimiter::new(DelimiterKind::Full, i, stop, '@'))
}

#[derive(Debug, Default)]
pub struct LiteralAutolinkTokenizer;

impl InlineTokenizer for LiteralAutolinkTokenizer {
    fn name(&self) -> &'static str {
        LITERAL_AUTOLINK
    }

    fn priority(&self) -> i32 {
        25
    }

    fn find_delimiter(
        &self,
        start: usize,
        end: usize,
        ctx: &InlineContext<'_>,
    ) -> Option<Delimiter> {
        if ctx.is_inside(LINK) {
            return None;
        }
        let points = ctx.points();
        (start..end).find_map(|i| match points[i].ch {
            'w' | 'W' | 'h' | 'H' => {
                literal_url(i, end, ctx).or_else(|| literal_email(i, end, ctx))
            }
            c if is_email_local(c) => literal_email(i, end, ctx),
            _ => None,
        })
    }

    fn process_full_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        let text = ctx.source(delimiter.start, delimiter.end);
        let url = match delimiter.marker {
            '@' => format!("mailto:{}", text),
            _ if text.to_ascii_lowercase().starts_with("www.") => format!("http://{}", text),
            _ => text,
        };
        Some(InlineToken::new(
            LITERAL_AUTOLINK,
            delimiter.start,
            delimiter.end,
            LiteralAutolinkState { url },
        ))
    }

    fn parse_inline(
        &self,
        token: &InlineToken,
        _children: Vec<Node>,
        ctx: &InlineContext<'_>,
    ) -> Node {
        let state = token.state::<LiteralAutolinkState>();
        link_with_text(&state.url, token.start, token.end, ctx)
    }
}
