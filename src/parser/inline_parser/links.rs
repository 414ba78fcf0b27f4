//! Links and images: `[text](dest "title")`, `[text][label]`, `[label][]`,
//! `[label]` and their `![...]` image forms.
//!
//! `[` and `![` are openers. A `]` is a closer that swallows whatever link
//! suffix follows it, so the pairing hooks can re-read the suffix from the
//! source.

use crate::parser::api::InlineContext;
use crate::parser::chars::{NodePoint, is_escaped, skip_whitespace};
use crate::parser::link_parts::{label_text, scan_destination, scan_label, scan_title};
use crate::parser::registry::IdentifierRegistry;
use crate::parser::tokenizer::{
    Delimiter, DelimiterKind, InlineToken, InlineTokenizer, PairOutcome, PairResult,
};
use crate::syntax::{Node, NodeValue};

pub const LINK: &str = "link";

#[derive(Debug, Clone, PartialEq, Eq)]
enum LinkSuffix {
    Resource { url: String, title: Option<String> },
    Full { label: String },
    Collapsed,
    Shortcut,
}

/// Parse `(dest "title")` starting at the `(`. Returns the index after `)`.
fn parse_resource(
    points: &[NodePoint],
    open_paren: usize,
    end: usize,
) -> Option<(usize, String, Option<String>)> {
    let i = skip_whitespace(points, open_paren + 1, end);
    if i < end && points[i].ch == ')' {
        return Some((i + 1, String::new(), None));
    }
    let (dest_end, url) = scan_destination(points, i, end)?;
    let j = skip_whitespace(points, dest_end, end);
    if j < end && points[j].ch == ')' {
        return Some((j + 1, url, None));
    }
    if j == dest_end {
        return None;
    }
    let (title_end, title) = scan_title(points, j, end)?;
    let k = skip_whitespace(points, title_end, end);
    (k < end && points[k].ch == ')').then(|| (k + 1, url, Some(title)))
}

/// Parse what follows a `]` at `after` (the index after the bracket).
fn parse_suffix(points: &[NodePoint], after: usize, end: usize) -> (LinkSuffix, usize) {
    if after < end
        && points[after].ch == '('
        && let Some((stop, url, title)) = parse_resource(points, after, end)
    {
        return (LinkSuffix::Resource { url, title }, stop);
    }
    if after < end && points[after].ch == '[' {
        if after + 1 < end && points[after + 1].ch == ']' {
            return (LinkSuffix::Collapsed, after + 2);
        }
        if let Some(label_end) = scan_label(points, after, end) {
            let label = label_text(points, after, label_end);
            return (LinkSuffix::Full { label }, label_end);
        }
    }
    (LinkSuffix::Shortcut, after)
}

/// Whether a link label follows `index`, which rules out a shortcut reference.
fn followed_by_label(points: &[NodePoint], index: usize) -> bool {
    index < points.len()
        && points[index].ch == '['
        && (points.get(index + 1).is_some_and(|p| p.ch == ']')
            || scan_label(points, index, points.len()).is_some())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkState {
    url: String,
    title: Option<String>,
    image: bool,
}

#[derive(Debug, Default)]
pub struct LinkTokenizer;

impl LinkTokenizer {
    /// Resolve the destination of an opener/closer pair, looking reference
    /// forms up in the registry.
    fn resolve(
        &self,
        opener: &Delimiter,
        closer: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Option<(String, Option<String>)> {
        let points = ctx.points();
        let registry: &IdentifierRegistry = ctx.registry();
        let lookup = |label: &str| {
            registry
                .definition(label)
                .map(|d| (d.url.clone(), d.title.clone()))
        };

        match parse_suffix(points, closer.start + 1, closer.end).0 {
            LinkSuffix::Resource { url, title } => Some((url, title)),
            LinkSuffix::Full { label } => lookup(&label),
            suffix => {
                if suffix == LinkSuffix::Shortcut && followed_by_label(points, closer.end) {
                    return None;
                }
                // The link text doubles as the label and must itself be one.
                let bracket = opener.end - 1;
                if scan_label(points, bracket, closer.start + 1) != Some(closer.start + 1) {
                    return None;
                }
                lookup(&label_text(points, bracket, closer.start + 1))
            }
        }
    }
}

fn contains_link(tokens: &[InlineToken]) -> bool {
    tokens.iter().any(|token| {
        token
            .try_state::<LinkState>()
            .is_some_and(|state| token.tokenizer == LINK && !state.image)
            || contains_link(&token.children)
    })
}

impl InlineTokenizer for LinkTokenizer {
    fn name(&self) -> &'static str {
        LINK
    }

    fn priority(&self) -> i32 {
        30
    }

    fn find_delimiter(
        &self,
        start: usize,
        end: usize,
        ctx: &InlineContext<'_>,
    ) -> Option<Delimiter> {
        let points = ctx.points();
        (start..end).find_map(|i| {
            if is_escaped(points, start, i) {
                return None;
            }
            match points[i].ch {
                '!' if i + 1 < end && points[i + 1].ch == '[' => {
                    Some(Delimiter::new(DelimiterKind::Opener, i, i + 2, '!'))
                }
                '[' => Some(Delimiter::new(DelimiterKind::Opener, i, i + 1, '[')),
                ']' => {
                    let (suffix, stop) = parse_suffix(points, i + 1, end);
                    let stop = match suffix {
                        LinkSuffix::Full { label } if !ctx.registry().has_definition(&label) => {
                            i + 1
                        }
                        _ => stop,
                    };
                    Some(Delimiter::new(DelimiterKind::Closer, i, stop, ']'))
                }
                _ => None,
            }
        })
    }

    fn is_delimiter_pair(
        &self,
        opener: &Delimiter,
        closer: &Delimiter,
        inner: &[InlineToken],
        ctx: &InlineContext<'_>,
    ) -> PairResult {
        // Links do not nest: once a link closes, the brackets around it are literal.
        if opener.marker == '[' && contains_link(inner) {
            return PairResult::Unpaired {
                opener: false,
                closer: false,
            };
        }
        match self.resolve(opener, closer, ctx) {
            Some(_) => PairResult::Paired,
            None => PairResult::Unpaired {
                opener: false,
                closer: false,
            },
        }
    }

    fn process_delimiter_pair(
        &self,
        opener: &Delimiter,
        closer: &Delimiter,
        inner: Vec<InlineToken>,
        ctx: &InlineContext<'_>,
    ) -> PairOutcome {
        let (url, title) = self.resolve(opener, closer, ctx).unwrap_or_default();
        log::trace!("Link {}..{} -> {:?}", opener.start, closer.end, url);
        PairOutcome {
            tokens: vec![InlineToken::with_content(
                LINK,
                opener.start,
                closer.end,
                opener.end..closer.start,
                inner,
                LinkState {
                    url,
                    title,
                    image: opener.marker == '!',
                },
            )],
            remaining_opener: None,
            remaining_closer: None,
        }
    }

    /// A `]` left without an opener is literal, but a defined `[label]`
    /// swallowed as its suffix still stands as a shortcut reference.
    fn process_single_delimiter(
        &self,
        delimiter: &Delimiter,
        ctx: &InlineContext<'_>,
    ) -> Vec<InlineToken> {
        let points = ctx.points();
        let bracket = delimiter.start + 1;
        if delimiter.marker != ']' || bracket >= delimiter.end || points[bracket].ch != '[' {
            return Vec::new();
        }
        let LinkSuffix::Full { label } = parse_suffix(points, bracket, delimiter.end).0 else {
            return Vec::new();
        };
        if followed_by_label(points, delimiter.end) {
            return Vec::new();
        }
        let Some(definition) = ctx.registry().definition(&label) else {
            return Vec::new();
        };
        vec![InlineToken::with_content(
            LINK,
            bracket,
            delimiter.end,
            bracket + 1..delimiter.end - 1,
            Vec::new(),
            LinkState {
                url: definition.url.clone(),
                title: definition.title.clone(),
                image: false,
            },
        )]
    }

    fn parse_inline(
        &self,
        token: &InlineToken,
        children: Vec<Node>,
        _ctx: &InlineContext<'_>,
    ) -> Node {
        let state = token.state::<LinkState>();
        if state.image {
            let alt = children.iter().map(Node::to_plain_text).collect();
            return Node::new(NodeValue::Image {
                url: state.url.clone(),
                alt,
                title: state.title.clone(),
            });
        }
        Node::with_children(
            NodeValue::Link {
                url: state.url.clone(),
                title: state.title.clone(),
            },
            children,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::chars::code_points;

    fn suffix(input: &str) -> (LinkSuffix, usize) {
        let points = code_points(input);
        parse_suffix(&points, 0, points.len())
    }

    #[test]
    fn test_inline_resource() {
        assert_eq!(
            suffix("(/url \"title\") x"),
            (
                LinkSuffix::Resource {
                    url: "/url".into(),
                    title: Some("title".into())
                },
                14
            )
        );
        assert_eq!(
            suffix("()"),
            (
                LinkSuffix::Resource {
                    url: String::new(),
                    title: None
                },
                2
            )
        );
        assert_eq!(
            suffix("(<a b> )"),
            (
                LinkSuffix::Resource {
                    url: "a b".into(),
                    title: None
                },
                8
            )
        );
    }

    #[test]
    fn test_invalid_resource_falls_back() {
        assert_eq!(suffix("(a b)"), (LinkSuffix::Shortcut, 0));
        assert_eq!(suffix("(/u \"t\" x)"), (LinkSuffix::Shortcut, 0));
    }

    #[test]
    fn test_reference_suffixes() {
        assert_eq!(
            suffix("[Ref] x"),
            (LinkSuffix::Full { label: "Ref".into() }, 5)
        );
        assert_eq!(suffix("[]"), (LinkSuffix::Collapsed, 2));
        assert_eq!(suffix(" [x]"), (LinkSuffix::Shortcut, 0));
    }

    #[test]
    fn test_followed_by_label() {
        let points = code_points("][a]");
        assert!(followed_by_label(&points, 1));
        let points = code_points("] [a]");
        assert!(!followed_by_label(&points, 1));
    }
}
