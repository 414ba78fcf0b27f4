//! Inline phase: delimiter passes over one phrasing-content leaf, then
//! reduction of the resulting tokens to AST nodes.

use std::cmp::Reverse;

use super::api::InlineContext;
use super::chars::{NodePoint, end_point, start_point};
use super::delimiter_processor::{fill_text, process_group};
use super::registry::IdentifierRegistry;
use super::tokenizer::{InlineToken, InlineTokenizer};
use crate::syntax::{Node, Position};

pub mod autolinks;
pub mod code_spans;
pub mod emphasis;
pub mod escapes;
pub mod footnote_references;
pub mod line_breaks;
pub mod links;
pub mod literal_autolinks;
pub mod raw_inline;
pub mod strikeout;
pub mod text;

pub use autolinks::{AUTOLINK, AutolinkTokenizer};
pub use code_spans::{INLINE_CODE, InlineCodeTokenizer};
pub use emphasis::{EMPHASIS, EmphasisTokenizer};
pub use footnote_references::{FOOTNOTE_REFERENCE, FootnoteReferenceTokenizer};
pub use line_breaks::{BREAK, BreakTokenizer};
pub use links::{LINK, LinkTokenizer};
pub use literal_autolinks::{LITERAL_AUTOLINK, LiteralAutolinkTokenizer};
pub use raw_inline::{HTML_INLINE, HtmlInlineTokenizer};
pub use strikeout::{DELETE, DeleteTokenizer};
pub use text::{TEXT, TextTokenizer};

#[cfg(test)]
mod tests;

/// Registered inline grammars, grouped into passes by priority.
pub struct InlinePipeline<'a> {
    /// Highest priority first; grammars of one group share a pass.
    groups: Vec<Vec<&'a dyn InlineTokenizer>>,
    fallback: &'a dyn InlineTokenizer,
}

impl<'a> InlinePipeline<'a> {
    pub fn new(mut tokenizers: Vec<&'a dyn InlineTokenizer>, fallback: &'a dyn InlineTokenizer) -> Self {
        // Stable, so registration order survives inside a group.
        tokenizers.sort_by_key(|t| Reverse(t.priority()));

        let mut groups: Vec<Vec<&'a dyn InlineTokenizer>> = Vec::new();
        for tokenizer in tokenizers {
            match groups.last_mut() {
                Some(group) if group[0].priority() == tokenizer.priority() => group.push(tokenizer),
                _ => groups.push(vec![tokenizer]),
            }
        }
        log::debug!(
            "Inline passes: {:?}",
            groups
                .iter()
                .map(|g| g.iter().map(|t| t.name()).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        );

        Self { groups, fallback }
    }

    /// Parse a phrasing-content buffer into inline nodes.
    pub fn parse(&self, points: &[NodePoint], registry: &IdentifierRegistry) -> Vec<Node> {
        let ctx = InlineContext::new(points, registry);
        let end = points.len();

        let mut tokens = Vec::new();
        for group in &self.groups {
            tokens = process_group(group, tokens, 0, end, &ctx);
        }
        let tokens = fill_text(self.fallback, tokens, 0, end, &ctx);

        tokens.iter().map(|token| self.reduce(token, &ctx)).collect()
    }

    fn lookup(&self, name: &str) -> &'a dyn InlineTokenizer {
        if self.fallback.name() == name {
            return self.fallback;
        }
        match self.groups.iter().flatten().find(|t| t.name() == name) {
            Some(tokenizer) => *tokenizer,
            None => panic!("no inline grammar registered for token `{}`", name),
        }
    }

    fn reduce(&self, token: &InlineToken, ctx: &InlineContext<'_>) -> Node {
        let children = token
            .children
            .iter()
            .map(|child| self.reduce(child, ctx))
            .collect();
        let mut node = self.lookup(token.tokenizer).parse_inline(token, children, ctx);
        if node.position.is_none() {
            let points = ctx.points();
            node.position = Some(Position {
                start: start_point(points, token.start),
                end: end_point(points, token.end),
            });
        }
        node
    }
}
