//! Parser entry point: grammar registration and the two-phase parse.
//!
//! Text is split into code points and lines, block grammars match the lines
//! into a token tree, post-match hooks rewrite sibling groups, and the block
//! reducer turns the tree into AST nodes, running the inline pipeline over
//! every phrasing-content leaf.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::config::Config;
use crate::syntax::Node;

pub mod api;
pub mod block_matcher;
pub mod block_parser;
pub mod chars;
pub mod delimiter_processor;
pub mod inline_parser;
pub mod lines;
pub mod link_parts;
pub mod post_match;
pub mod registry;
pub mod tokenizer;

use api::{BlockContext, ParseContext};
use block_matcher::BlockMatcher;
use block_parser::{
    AtxHeadingTokenizer, BlockReducer, BlockquoteTokenizer, DefinitionTokenizer,
    FencedCodeTokenizer, FootnoteDefinitionTokenizer, HtmlBlockTokenizer, IndentedCodeTokenizer,
    ListTokenizer, ParagraphTokenizer, SetextHeadingTokenizer, TableTokenizer,
    ThematicBreakTokenizer,
};
use inline_parser::{
    AutolinkTokenizer, BreakTokenizer, DeleteTokenizer, EmphasisTokenizer,
    FootnoteReferenceTokenizer, HtmlInlineTokenizer, InlineCodeTokenizer, InlinePipeline,
    LinkTokenizer, LiteralAutolinkTokenizer, TextTokenizer,
};
use registry::IdentifierRegistry;
use tokenizer::{BlockArena, BlockTokenizer, InlineTokenizer};

/// Per-call parse options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep source positions on every node.
    pub reserve_positions: bool,
}

impl From<&Config> for ParseOptions {
    fn from(config: &Config) -> Self {
        Self {
            reserve_positions: config.options.reserve_positions,
        }
    }
}

/// A configured set of grammars.
pub struct Parser {
    blocks: Vec<Box<dyn BlockTokenizer>>,
    inlines: Vec<Box<dyn InlineTokenizer>>,
    block_fallback: Box<dyn BlockTokenizer>,
    inline_fallback: Box<dyn InlineTokenizer>,
}

impl Parser {
    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    /// Parse `input` into a `root` node.
    pub fn parse(&self, input: &str, options: &ParseOptions) -> Node {
        let points = chars::code_points(input);
        let lines = lines::segment_lines(&points);
        let mut registry = IdentifierRegistry::new();
        let mut arena = BlockArena::new();

        // Priority order, fallback last, for every phase after matching.
        let mut blocks: Vec<&dyn BlockTokenizer> = self.blocks.iter().map(|b| b.as_ref()).collect();
        blocks.sort_by_key(|b| Reverse(b.priority()));
        let matcher = BlockMatcher::new(blocks.clone(), self.block_fallback.as_ref());
        blocks.push(self.block_fallback.as_ref());

        let root = {
            let mut ctx = BlockContext::new(&points, &mut registry);
            let root = matcher.match_document(&lines, &mut arena, &mut ctx);
            post_match::post_match(root, &mut arena, &mut ctx, &blocks);
            root
        };
        log::debug!(
            "Matched {} lines into {} block tokens",
            lines.len(),
            arena.len()
        );

        let inlines: Vec<&dyn InlineTokenizer> = self.inlines.iter().map(|i| i.as_ref()).collect();
        let pipeline = InlinePipeline::new(inlines, self.inline_fallback.as_ref());
        let ctx = ParseContext::new(&points, &registry, &pipeline);
        let mut node = BlockReducer::new(&blocks).reduce_document(root, &arena, &ctx);

        if !options.reserve_positions {
            node.strip_positions();
        }
        node
    }
}

impl Default for Parser {
    /// Every built-in GFM grammar.
    fn default() -> Self {
        ParserBuilder::from_config(&Config::default()).build()
    }
}

/// Registers grammars for a [`Parser`].
pub struct ParserBuilder {
    blocks: Vec<Box<dyn BlockTokenizer>>,
    inlines: Vec<Box<dyn InlineTokenizer>>,
    block_fallback: Option<Box<dyn BlockTokenizer>>,
    inline_fallback: Option<Box<dyn InlineTokenizer>>,
    names: HashSet<&'static str>,
}

impl ParserBuilder {
    /// A builder with no grammars. Fallbacks default to `paragraph` and
    /// `text` unless set.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            inlines: Vec::new(),
            block_fallback: None,
            inline_fallback: None,
            names: HashSet::new(),
        }
    }

    /// The built-in grammar set, filtered by the configured extensions.
    pub fn from_config(config: &Config) -> Self {
        let ext = &config.extensions;
        let mut builder = Self::new()
            .use_block_tokenizer(SetextHeadingTokenizer)
            .use_block_tokenizer(ThematicBreakTokenizer)
            .use_block_tokenizer(BlockquoteTokenizer)
            .use_block_tokenizer(ListTokenizer::new(ext.task_lists))
            .use_block_tokenizer(AtxHeadingTokenizer)
            .use_block_tokenizer(FencedCodeTokenizer)
            .use_block_tokenizer(HtmlBlockTokenizer)
            .use_block_tokenizer(DefinitionTokenizer)
            .use_block_tokenizer(IndentedCodeTokenizer)
            .use_inline_tokenizer(InlineCodeTokenizer)
            .use_inline_tokenizer(AutolinkTokenizer)
            .use_inline_tokenizer(HtmlInlineTokenizer)
            .use_inline_tokenizer(LinkTokenizer)
            .use_inline_tokenizer(EmphasisTokenizer)
            .use_inline_tokenizer(BreakTokenizer);

        if ext.tables {
            builder = builder.use_block_tokenizer(TableTokenizer);
        }
        if ext.footnotes {
            builder = builder
                .use_block_tokenizer(FootnoteDefinitionTokenizer)
                .use_inline_tokenizer(FootnoteReferenceTokenizer);
        }
        if ext.autolinks {
            builder = builder.use_inline_tokenizer(LiteralAutolinkTokenizer);
        }
        if ext.strikethrough {
            builder = builder.use_inline_tokenizer(DeleteTokenizer);
        }
        builder
    }

    fn claim(&mut self, name: &'static str) {
        if !self.names.insert(name) {
            panic!("a grammar named `{}` is already registered", name);
        }
    }

    pub fn use_block_tokenizer(mut self, tokenizer: impl BlockTokenizer + 'static) -> Self {
        self.claim(tokenizer.name());
        self.blocks.push(Box::new(tokenizer));
        self
    }

    pub fn use_inline_tokenizer(mut self, tokenizer: impl InlineTokenizer + 'static) -> Self {
        self.claim(tokenizer.name());
        self.inlines.push(Box::new(tokenizer));
        self
    }

    /// Remove a registered grammar. Unknown names are ignored.
    pub fn unmount_tokenizer(mut self, name: &str) -> Self {
        self.blocks.retain(|t| t.name() != name);
        self.inlines.retain(|t| t.name() != name);
        self.names.remove(name);
        self
    }

    pub fn block_fallback(mut self, tokenizer: impl BlockTokenizer + 'static) -> Self {
        self.claim(tokenizer.name());
        self.block_fallback = Some(Box::new(tokenizer));
        self
    }

    pub fn inline_fallback(mut self, tokenizer: impl InlineTokenizer + 'static) -> Self {
        self.claim(tokenizer.name());
        self.inline_fallback = Some(Box::new(tokenizer));
        self
    }

    pub fn build(mut self) -> Parser {
        let block_fallback = match self.block_fallback.take() {
            Some(fallback) => fallback,
            None => {
                self.claim(block_parser::PARAGRAPH);
                Box::new(ParagraphTokenizer)
            }
        };
        let inline_fallback = match self.inline_fallback.take() {
            Some(fallback) => fallback,
            None => {
                self.claim(inline_parser::TEXT);
                Box::new(TextTokenizer)
            }
        };
        log::debug!(
            "Parser with {} block and {} inline grammars",
            self.blocks.len() + 1,
            self.inlines.len() + 1
        );
        Parser {
            blocks: self.blocks,
            inlines: self.inlines,
            block_fallback,
            inline_fallback,
        }
    }
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}
