//! The hook protocol every grammar implements.
//!
//! A grammar registers under a unique name with an integer priority and
//! implements any subset of the hooks below. Block grammars take part in line
//! matching, the post-match rewrite and block reduction; inline grammars find
//! delimiters inside phrasing content, pair them, and reduce the resulting
//! tokens to AST nodes.

use std::any::Any;
use std::fmt;
use std::ops::Range;

use super::api::{BlockContext, InlineContext, ParseContext};
use super::lines::PhrasingLine;
use crate::syntax::Node;

/// Grammar-private data carried by a token.
pub trait TokenState: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + fmt::Debug> TokenState for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn downcast<'a, T: 'static>(owner: &str, state: &'a dyn TokenState) -> &'a T {
    match state.as_any().downcast_ref::<T>() {
        Some(s) => s,
        None => panic!(
            "token owned by `{}` does not carry a `{}` state",
            owner,
            std::any::type_name::<T>()
        ),
    }
}

fn downcast_mut<'a, T: 'static>(owner: &str, state: &'a mut dyn TokenState) -> &'a mut T {
    match state.as_any_mut().downcast_mut::<T>() {
        Some(s) => s,
        None => panic!(
            "token owned by `{}` does not carry a `{}` state",
            owner,
            std::any::type_name::<T>()
        ),
    }
}

/// Index of a block token in its [`BlockArena`].
pub type BlockId = usize;

/// A block under construction.
#[derive(Debug)]
pub struct BlockToken {
    /// Name of the owning grammar.
    pub tokenizer: &'static str,
    pub start: usize,
    pub end: usize,
    /// `Some` iff the token is a container.
    pub children: Option<Vec<BlockId>>,
    pub state: Box<dyn TokenState>,
}

impl BlockToken {
    pub fn leaf(tokenizer: &'static str, start: usize, end: usize, state: impl TokenState) -> Self {
        Self {
            tokenizer,
            start,
            end,
            children: None,
            state: Box::new(state),
        }
    }

    pub fn container(
        tokenizer: &'static str,
        start: usize,
        end: usize,
        state: impl TokenState,
    ) -> Self {
        Self {
            tokenizer,
            start,
            end,
            children: Some(Vec::new()),
            state: Box::new(state),
        }
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    /// Typed view of the grammar-private state. Panics on a type mismatch.
    pub fn state<T: 'static>(&self) -> &T {
        downcast(self.tokenizer, &*self.state)
    }

    pub fn state_mut<T: 'static>(&mut self) -> &mut T {
        downcast_mut(self.tokenizer, &mut *self.state)
    }

    pub fn try_state<T: 'static>(&self) -> Option<&T> {
        (*self.state).as_any().downcast_ref::<T>()
    }
}

/// Owner of every block token of one parse. Tokens refer to each other by
/// index so rollback and splicing never move live tokens.
#[derive(Debug, Default)]
pub struct BlockArena {
    tokens: Vec<BlockToken>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn alloc(&mut self, token: BlockToken) -> BlockId {
        self.tokens.push(token);
        self.tokens.len() - 1
    }

    pub fn get(&self, id: BlockId) -> &BlockToken {
        &self.tokens[id]
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut BlockToken {
        &mut self.tokens[id]
    }

    pub fn children(&self, id: BlockId) -> &[BlockId] {
        self.tokens[id].children.as_deref().unwrap_or(&[])
    }

    /// Append `child` to a container and extend the container's end.
    pub fn append_child(&mut self, parent: BlockId, child: BlockId) {
        let child_end = self.tokens[child].end;
        let token = &mut self.tokens[parent];
        match token.children.as_mut() {
            Some(children) => children.push(child),
            None => panic!("`{}` token is not a container", token.tokenizer),
        }
        if child_end > token.end {
            token.end = child_end;
        }
    }

    pub fn last_child(&self, parent: BlockId) -> Option<BlockId> {
        self.children(parent).last().copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// What a hook can see of the parent of the token it is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentInfo {
    pub tokenizer: &'static str,
    pub start: usize,
}

#[derive(Debug)]
pub struct EatOpenerResult {
    pub token: BlockToken,
    pub next_index: usize,
    /// The token can not take any further line and is closed right away.
    pub saturated: bool,
}

#[derive(Debug)]
pub struct EatInterruptResult {
    pub token: BlockToken,
    pub next_index: usize,
    pub saturated: bool,
    /// Whether the interrupted sibling survives (possibly shortened by the hook).
    pub keep_previous: bool,
}

/// Answer of a block hook to "does this line still belong to your token?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationStatus {
    /// The line continues the token; descent goes on from `next_index`.
    Opening { next_index: usize },
    /// The token takes the line up to `next_index` and is then complete.
    Closing { next_index: usize },
    /// The token does not claim the line but stays open for lazy continuation.
    NotMatched,
    /// The token is complete without this line; the returned lines it had
    /// accumulated are re-matched after it.
    ClosingAndRollback { lines: Vec<PhrasingLine> },
    /// The token never became well-formed; it is dropped and the returned
    /// lines are re-matched in its place.
    FailedAndRollback { lines: Vec<PhrasingLine> },
}

/// Rollback requested by [`BlockTokenizer::on_close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollback {
    pub lines: Vec<PhrasingLine>,
    /// Keep the closing token and re-match the lines after it, rather than
    /// replacing the token with them.
    pub keep_token: bool,
}

pub trait BlockTokenizer {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32;

    /// Try to start a new block at the cursor of `line`.
    fn eat_opener(
        &self,
        line: &PhrasingLine,
        parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult>;

    /// Try to start a block that pre-empts the still-open `previous` sibling.
    fn eat_and_interrupt_previous_sibling(
        &self,
        _line: &PhrasingLine,
        _previous: &mut BlockToken,
        _parent: ParentInfo,
        _ctx: &mut BlockContext<'_>,
    ) -> Option<EatInterruptResult> {
        None
    }

    fn eat_continuation_text(
        &self,
        _line: &PhrasingLine,
        _token: &mut BlockToken,
        _parent: ParentInfo,
        _ctx: &mut BlockContext<'_>,
    ) -> ContinuationStatus {
        ContinuationStatus::NotMatched
    }

    /// Whether an open leaf of this grammar can take lazy continuation lines.
    /// New blocks that would cut such a leaf short are asked with
    /// [`BlockContext::is_interrupting_paragraph`] set.
    fn supports_lazy_continuation(&self) -> bool {
        false
    }

    /// Relaxed continuation, offered only to the deepest open block when its
    /// ancestors did not all match. Returns the next index on success.
    fn eat_lazy_continuation_text(
        &self,
        _line: &PhrasingLine,
        _token: &mut BlockToken,
        _parent: ParentInfo,
        _ctx: &mut BlockContext<'_>,
    ) -> Option<usize> {
        None
    }

    /// Called once when the token is finalized.
    fn on_close(&self, _token: &mut BlockToken, _ctx: &mut BlockContext<'_>) -> Option<Rollback> {
        None
    }

    /// Rewrite one group of same-parent siblings; children have already been visited.
    fn post_match(
        &self,
        siblings: Vec<BlockId>,
        _arena: &mut BlockArena,
        _ctx: &mut BlockContext<'_>,
    ) -> Vec<BlockId> {
        siblings
    }

    /// Reduce a token plus its already-parsed children to zero or one node.
    fn parse_block(
        &self,
        token: &BlockToken,
        children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node>;
}

/// Role of a delimiter found inside phrasing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Opener,
    Closer,
    Both,
    /// Self-contained; never pairs.
    Full,
}

impl DelimiterKind {
    pub fn can_open(self) -> bool {
        matches!(self, Self::Opener | Self::Both)
    }

    pub fn can_close(self) -> bool {
        matches!(self, Self::Closer | Self::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    pub kind: DelimiterKind,
    pub start: usize,
    pub end: usize,
    /// Marker character of the run (`*`, `_`, `[`, ...).
    pub marker: char,
    /// Remaining run length.
    pub thickness: usize,
    /// Run length as originally found.
    pub original_thickness: usize,
}

impl Delimiter {
    pub fn new(kind: DelimiterKind, start: usize, end: usize, marker: char) -> Self {
        Self {
            kind,
            start,
            end,
            marker,
            thickness: end - start,
            original_thickness: end - start,
        }
    }
}

/// Result of [`InlineTokenizer::is_delimiter_pair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairResult {
    Paired,
    /// The pair does not match; the flags tell which side is still usable.
    Unpaired { opener: bool, closer: bool },
}

#[derive(Debug)]
pub struct PairOutcome {
    pub tokens: Vec<InlineToken>,
    pub remaining_opener: Option<Delimiter>,
    pub remaining_closer: Option<Delimiter>,
}

/// A matched inline construct.
#[derive(Debug)]
pub struct InlineToken {
    pub tokenizer: &'static str,
    pub start: usize,
    pub end: usize,
    /// Range holding nested phrasing content, visited by lower-priority passes.
    pub content: Option<Range<usize>>,
    pub children: Vec<InlineToken>,
    pub state: Box<dyn TokenState>,
}

impl InlineToken {
    pub fn new(tokenizer: &'static str, start: usize, end: usize, state: impl TokenState) -> Self {
        Self {
            tokenizer,
            start,
            end,
            content: None,
            children: Vec::new(),
            state: Box::new(state),
        }
    }

    pub fn with_content(
        tokenizer: &'static str,
        start: usize,
        end: usize,
        content: Range<usize>,
        children: Vec<InlineToken>,
        state: impl TokenState,
    ) -> Self {
        Self {
            tokenizer,
            start,
            end,
            content: Some(content),
            children,
            state: Box::new(state),
        }
    }

    pub fn state<T: 'static>(&self) -> &T {
        downcast(self.tokenizer, &*self.state)
    }

    pub fn try_state<T: 'static>(&self) -> Option<&T> {
        (*self.state).as_any().downcast_ref::<T>()
    }
}

pub trait InlineTokenizer {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32;

    /// First delimiter starting at or after `start` and ending before `end`.
    fn find_delimiter(&self, start: usize, end: usize, ctx: &InlineContext<'_>)
    -> Option<Delimiter>;

    fn is_delimiter_pair(
        &self,
        _opener: &Delimiter,
        _closer: &Delimiter,
        _inner: &[InlineToken],
        _ctx: &InlineContext<'_>,
    ) -> PairResult {
        PairResult::Paired
    }

    fn process_delimiter_pair(
        &self,
        _opener: &Delimiter,
        _closer: &Delimiter,
        inner: Vec<InlineToken>,
        _ctx: &InlineContext<'_>,
    ) -> PairOutcome {
        PairOutcome {
            tokens: inner,
            remaining_opener: None,
            remaining_closer: None,
        }
    }

    /// Handle a delimiter that never paired. Returned tokens replace it; an
    /// empty result leaves its text to the fallback grammar.
    fn process_single_delimiter(
        &self,
        _delimiter: &Delimiter,
        _ctx: &InlineContext<'_>,
    ) -> Vec<InlineToken> {
        Vec::new()
    }

    fn process_full_delimiter(
        &self,
        _delimiter: &Delimiter,
        _ctx: &InlineContext<'_>,
    ) -> Option<InlineToken> {
        None
    }

    fn parse_inline(&self, token: &InlineToken, children: Vec<Node>, ctx: &InlineContext<'_>)
    -> Node;
}
