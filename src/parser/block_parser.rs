//! Block reduction and the built-in block grammars.

use super::api::{BlockContext, ParseContext};
use super::block_matcher::ROOT;
use super::chars::{end_point, start_point};
use super::lines::PhrasingLine;
use super::tokenizer::{BlockArena, BlockId, BlockToken, BlockTokenizer, EatInterruptResult, ParentInfo};
use crate::syntax::{Node, NodeValue, Position};

pub mod blockquotes;
pub mod code_blocks;
pub mod footnote_definitions;
pub mod headings;
pub mod horizontal_rules;
pub mod html_blocks;
pub mod indented_code;
pub mod lists;
pub mod paragraphs;
pub mod reference_definitions;
pub mod setext_headings;
pub mod tables;

#[cfg(test)]
pub(crate) mod tests;

pub use blockquotes::{BLOCKQUOTE, BlockquoteTokenizer};
pub use code_blocks::{FENCED_CODE, FencedCodeTokenizer};
pub use footnote_definitions::{FOOTNOTE_DEFINITION, FootnoteDefinitionTokenizer};
pub use headings::{ATX_HEADING, AtxHeadingTokenizer};
pub use horizontal_rules::{THEMATIC_BREAK, ThematicBreakTokenizer};
pub use html_blocks::{HTML_BLOCK, HtmlBlockTokenizer};
pub use indented_code::{INDENTED_CODE, IndentedCodeTokenizer};
pub use lists::{LIST, ListTokenizer};
pub use paragraphs::{PARAGRAPH, ParagraphTokenizer};
pub use reference_definitions::{DEFINITION, DefinitionTokenizer};
pub use setext_headings::{SETEXT_HEADING, SetextHeadingTokenizer};
pub use tables::{TABLE, TableTokenizer};

/// Whether `previous` is a paragraph-like leaf that block starts may cut short.
pub(crate) fn is_interruptible(previous: &BlockToken) -> bool {
    matches!(previous.tokenizer, PARAGRAPH | DEFINITION)
}

/// Interrupt a paragraph-like sibling with whatever `tokenizer` would open
/// on this line, keeping the sibling.
pub(crate) fn interrupt_with_opener(
    tokenizer: &dyn BlockTokenizer,
    line: &PhrasingLine,
    previous: &BlockToken,
    parent: ParentInfo,
    ctx: &mut BlockContext<'_>,
) -> Option<EatInterruptResult> {
    if !is_interruptible(previous) {
        return None;
    }
    let opened = tokenizer.eat_opener(line, parent, ctx)?;
    Some(EatInterruptResult {
        token: opened.token,
        next_index: opened.next_index,
        saturated: opened.saturated,
        keep_previous: true,
    })
}

/// Post-order reduction of the matched token tree into AST nodes.
pub struct BlockReducer<'a> {
    hooks: &'a [&'a dyn BlockTokenizer],
}

impl<'a> BlockReducer<'a> {
    pub fn new(hooks: &'a [&'a dyn BlockTokenizer]) -> Self {
        Self { hooks }
    }

    pub fn reduce_document(&self, root: BlockId, arena: &BlockArena, ctx: &ParseContext<'_>) -> Node {
        let children = self.reduce_children(root, arena, ctx);
        let token = arena.get(root);
        let mut node = Node::with_children(NodeValue::Root, children);
        node.position = Some(self.position(token, ctx));
        node
    }

    fn reduce_children(&self, id: BlockId, arena: &BlockArena, ctx: &ParseContext<'_>) -> Vec<Node> {
        arena
            .children(id)
            .iter()
            .filter_map(|&child| self.reduce(child, arena, ctx))
            .collect()
    }

    fn reduce(&self, id: BlockId, arena: &BlockArena, ctx: &ParseContext<'_>) -> Option<Node> {
        let token = arena.get(id);
        if token.tokenizer == ROOT {
            panic!("nested `{}` token left in the block tree", ROOT);
        }
        let Some(hook) = self.hooks.iter().find(|h| h.name() == token.tokenizer) else {
            panic!("no block grammar registered for token `{}`", token.tokenizer);
        };

        let children = self.reduce_children(id, arena, ctx);
        let mut node = hook.parse_block(token, children, ctx)?;
        if node.position.is_none() {
            node.position = Some(self.position(token, ctx));
        }
        Some(node)
    }

    fn position(&self, token: &BlockToken, ctx: &ParseContext<'_>) -> Position {
        let points = ctx.points();
        Position {
            start: start_point(points, token.start),
            end: end_point(points, token.end),
        }
    }
}
