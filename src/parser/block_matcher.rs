//! Block structure matching: phase one of the parse.
//!
//! Lines are consumed one at a time against a stack of open blocks. Each
//! line goes through three steps:
//!
//! 1. Descend the open blocks, asking each owner whether the line continues
//!    its token (after giving higher-priority grammars a chance to interrupt).
//! 2. Open new blocks from the deepest matched container.
//! 3. Offer what is left to the deepest open block as lazy continuation, or
//!    close the unmatched blocks and hand the remainder to the fallback grammar.
//!
//! A grammar that finds out late that its token never became well-formed
//! returns the lines it accumulated; they are re-matched by a nested matcher
//! without that grammar and the result is spliced in place of the token.

use super::api::BlockContext;
use super::lines::PhrasingLine;
use super::tokenizer::{
    BlockArena, BlockId, BlockToken, BlockTokenizer, ContinuationStatus, ParentInfo, Rollback,
};

/// Owner name of the synthetic root token.
pub const ROOT: &str = "root";

#[derive(Clone, Copy)]
struct Frame<'h> {
    id: BlockId,
    hook: Option<&'h dyn BlockTokenizer>,
}

impl Frame<'_> {
    fn priority(&self) -> i32 {
        self.hook.map_or(i32::MAX, |h| h.priority())
    }
}

/// The open-block stack. Index 0 is the root of the (sub)document.
struct MatchState<'h> {
    stack: Vec<Frame<'h>>,
}

/// Sub-tree produced by re-matching rolled back lines.
struct Rematched<'h> {
    children: Vec<BlockId>,
    open: Vec<Frame<'h>>,
}

pub struct BlockMatcher<'h> {
    /// Non-fallback grammars, highest priority first.
    hooks: Vec<&'h dyn BlockTokenizer>,
    fallback: &'h dyn BlockTokenizer,
}

impl<'h> BlockMatcher<'h> {
    pub fn new(hooks: Vec<&'h dyn BlockTokenizer>, fallback: &'h dyn BlockTokenizer) -> Self {
        Self { hooks, fallback }
    }

    /// Match every line and return the id of the root token.
    pub fn match_document(
        &self,
        lines: &[PhrasingLine],
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
    ) -> BlockId {
        let end = ctx.points().len();
        let root = arena.alloc(BlockToken::container(ROOT, 0, 0, ()));
        let mut state = MatchState {
            stack: vec![Frame {
                id: root,
                hook: None,
            }],
        };

        log::debug!("Matching {} lines", lines.len());
        for line in lines {
            self.process_line(&mut state, arena, ctx, line);
        }
        self.close_frames_from(&mut state, arena, ctx, 1);
        arena.get_mut(root).end = end;
        root
    }

    fn process_line(
        &self,
        state: &mut MatchState<'h>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        line: &PhrasingLine,
    ) {
        let points = ctx.points();
        let mut i = line.start;
        ctx.reset_split_tab();

        log::trace!(
            "Line {}: depth={} {:?}",
            points.get(line.start).map_or(0, |p| p.line),
            state.stack.len() - 1,
            ctx.source(line.start, line.content_end(points))
        );

        // Step 1: descend the open blocks.
        let mut depth = 1;
        let mut interrupted = false;
        while depth < state.stack.len() {
            let frame = state.stack[depth];
            let Some(hook) = frame.hook else { break };
            let here = ctx.line_at(line, i);
            let parent = self.parent_info(state, arena, depth);

            if let Some(next) = self.try_interrupt(state, arena, ctx, depth, &here, parent) {
                i = next;
                interrupted = true;
                break;
            }

            let status = hook.eat_continuation_text(&here, arena.get_mut(frame.id), parent, ctx);
            match status {
                ContinuationStatus::Opening { next_index } => {
                    i = next_index;
                    depth += 1;
                }
                ContinuationStatus::Closing { next_index } => {
                    i = next_index;
                    self.close_frames_from(state, arena, ctx, depth);
                    break;
                }
                ContinuationStatus::NotMatched => break,
                ContinuationStatus::ClosingAndRollback { lines } => {
                    log::debug!("`{}` closes and rolls back {} lines", hook.name(), lines.len());
                    self.close_frames_from(state, arena, ctx, depth);
                    self.splice_rollback(state, arena, ctx, hook.name(), &lines);
                }
                ContinuationStatus::FailedAndRollback { lines } => {
                    log::debug!("`{}` failed, rolling back {} lines", hook.name(), lines.len());
                    state.stack.truncate(depth);
                    let parent_id = state.stack[depth - 1].id;
                    remove_last_child(arena, parent_id, frame.id);
                    self.splice_rollback(state, arena, ctx, hook.name(), &lines);
                }
            }
        }

        if interrupted {
            // The interrupting token is now the top frame; a container keeps
            // opening blocks from there.
            let top = state.stack.len() - 1;
            if arena.get(state.stack[top].id).is_container() {
                (i, _) = self.open_new_blocks(state, arena, ctx, line, i, top, false);
                i = self.finish_line(state, arena, ctx, line, i);
            }
            self.assert_consumed(ctx, line, skip_blank_rest(ctx, line, i));
            return;
        }

        // A matched leaf owns the rest of the line.
        let matched = depth.min(state.stack.len());
        let cursor = matched - 1;
        if !arena.get(state.stack[cursor].id).is_container() {
            self.assert_consumed(ctx, line, skip_blank_rest(ctx, line, i));
            return;
        }

        let lazy_candidate = matched < state.stack.len() && {
            let top = state.stack[state.stack.len() - 1];
            top.hook.is_some_and(|h| h.supports_lazy_continuation())
                && !arena.get(top.id).is_container()
        };

        // Step 2: open new blocks.
        let here = ctx.line_at(line, i);
        let mut opened = false;
        if !(lazy_candidate && here.count_of_preceding_space >= 4) {
            (i, opened) = self.open_new_blocks(state, arena, ctx, line, i, cursor, lazy_candidate);
        }

        // Step 3: lazy continuation or fallback.
        let here = ctx.line_at(line, i);
        if !opened && lazy_candidate && !here.is_blank(points) {
            let top = state.stack[state.stack.len() - 1];
            let parent = self.parent_info(state, arena, state.stack.len() - 1);
            if let Some(hook) = top.hook
                && let Some(next) =
                    hook.eat_lazy_continuation_text(&here, arena.get_mut(top.id), parent, ctx)
            {
                log::trace!("Lazy continuation of `{}`", hook.name());
                self.assert_consumed(ctx, line, skip_blank_rest(ctx, line, next));
                return;
            }
        }

        if !opened {
            self.close_frames_from(state, arena, ctx, matched);
        }
        i = self.finish_line(state, arena, ctx, line, i);
        self.assert_consumed(ctx, line, i);
    }

    /// Offer the remainder of the line to `eat_and_interrupt_previous_sibling`
    /// of every grammar ranked above the owner of the frame at `depth`.
    fn try_interrupt(
        &self,
        state: &mut MatchState<'h>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        depth: usize,
        line: &PhrasingLine,
        parent: ParentInfo,
    ) -> Option<usize> {
        let frame = state.stack[depth];
        let owner_priority = frame.priority();
        let owner_name = frame.hook.map(|h| h.name());

        ctx.set_interrupting(true);
        let mut found = None;
        for &hook in &self.hooks {
            if hook.priority() <= owner_priority {
                break;
            }
            if Some(hook.name()) == owner_name {
                continue;
            }
            if let Some(result) =
                hook.eat_and_interrupt_previous_sibling(line, arena.get_mut(frame.id), parent, ctx)
            {
                found = Some((hook, result));
                break;
            }
        }
        ctx.set_interrupting(false);

        let (hook, result) = found?;
        log::trace!(
            "`{}` interrupts `{}`",
            hook.name(),
            owner_name.unwrap_or(ROOT)
        );
        self.assert_progress(hook, line.start, result.next_index, &result.token);

        if result.keep_previous {
            self.close_frames_from(state, arena, ctx, depth);
        } else {
            state.stack.truncate(depth);
            let parent_id = state.stack[depth - 1].id;
            remove_last_child(arena, parent_id, frame.id);
        }

        let parent_id = state.stack[depth - 1].id;
        let id = arena.alloc(result.token);
        arena.append_child(parent_id, id);
        state.stack.push(Frame {
            id,
            hook: Some(hook),
        });
        if result.saturated {
            self.close_frames_from(state, arena, ctx, state.stack.len() - 1);
        }
        Some(result.next_index)
    }

    /// Step 2 from the container at stack index `cursor`. Returns the new
    /// index and whether any block was opened.
    #[allow(clippy::too_many_arguments)]
    fn open_new_blocks(
        &self,
        state: &mut MatchState<'h>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        line: &PhrasingLine,
        mut i: usize,
        cursor: usize,
        interrupting: bool,
    ) -> (usize, bool) {
        let points = ctx.points();
        let mut parent_depth = cursor;
        let mut interrupting = interrupting;
        let mut opened = false;

        loop {
            let here = ctx.line_at(line, i);
            if here.is_blank(points) {
                break;
            }
            let parent = self.parent_info(state, arena, parent_depth + 1);

            ctx.set_interrupting(interrupting);
            let found = self
                .hooks
                .iter()
                .find_map(|&hook| hook.eat_opener(&here, parent, ctx).map(|r| (hook, r)));
            ctx.set_interrupting(false);

            let Some((hook, result)) = found else { break };
            self.assert_progress(hook, i, result.next_index, &result.token);
            log::trace!("`{}` opens at {}", hook.name(), i);

            if !opened {
                // Unmatched frames end as soon as something new opens.
                self.close_frames_from(state, arena, ctx, parent_depth + 1);
                opened = true;
            }

            let parent_id = state.stack[parent_depth].id;
            let is_container = result.token.is_container();
            let id = arena.alloc(result.token);
            arena.append_child(parent_id, id);
            state.stack.push(Frame {
                id,
                hook: Some(hook),
            });
            i = result.next_index;

            if result.saturated {
                self.close_frames_from(state, arena, ctx, state.stack.len() - 1);
                break;
            }
            if !is_container {
                break;
            }
            parent_depth = state.stack.len() - 1;
            interrupting = false;
        }
        (i, opened)
    }

    /// Hand a non-blank remainder to the fallback grammar; a blank remainder
    /// is simply consumed.
    fn finish_line(
        &self,
        state: &mut MatchState<'h>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        line: &PhrasingLine,
        i: usize,
    ) -> usize {
        let points = ctx.points();
        let here = ctx.line_at(line, i);
        if here.is_blank(points) {
            return line.end;
        }
        let top = state.stack[state.stack.len() - 1];
        if !arena.get(top.id).is_container() {
            return i;
        }

        let parent = self.parent_info(state, arena, state.stack.len());
        let Some(result) = self.fallback.eat_opener(&here, parent, ctx) else {
            panic!(
                "fallback grammar `{}` did not accept {:?}",
                self.fallback.name(),
                ctx.source(here.start, here.end)
            );
        };
        self.assert_progress(self.fallback, i, result.next_index, &result.token);

        let id = arena.alloc(result.token);
        arena.append_child(top.id, id);
        state.stack.push(Frame {
            id,
            hook: Some(self.fallback),
        });
        if result.saturated {
            self.close_frames_from(state, arena, ctx, state.stack.len() - 1);
        }
        skip_blank_rest(ctx, line, result.next_index)
    }

    /// Close frames top-down until only `keep` remain.
    fn close_frames_from(
        &self,
        state: &mut MatchState<'h>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        keep: usize,
    ) {
        while state.stack.len() > keep.max(1) {
            let Some(frame) = state.stack.pop() else { break };
            let Some(hook) = frame.hook else { break };
            let parent_id = state.stack[state.stack.len() - 1].id;

            let rollback = hook.on_close(arena.get_mut(frame.id), ctx);
            refresh_end(arena, parent_id, frame.id);

            if let Some(Rollback { lines, keep_token }) = rollback {
                log::debug!(
                    "`{}` rolls back {} lines on close (keep_token={})",
                    hook.name(),
                    lines.len(),
                    keep_token
                );
                if !keep_token {
                    remove_last_child(arena, parent_id, frame.id);
                }
                let rematched = self.rematch(arena, ctx, hook.name(), &lines, true);
                for child in rematched.children {
                    arena.append_child(parent_id, child);
                }
            }
        }
    }

    /// Re-match rolled back lines and graft the result onto the top frame.
    fn splice_rollback(
        &self,
        state: &mut MatchState<'h>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        failed: &str,
        lines: &[PhrasingLine],
    ) {
        let parent_id = state.stack[state.stack.len() - 1].id;
        let rematched = self.rematch(arena, ctx, failed, lines, false);
        for child in rematched.children {
            arena.append_child(parent_id, child);
        }
        state.stack.extend(rematched.open);
    }

    /// Feed `lines` through a nested matcher without the `failed` grammar.
    fn rematch(
        &self,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
        failed: &str,
        lines: &[PhrasingLine],
        finish: bool,
    ) -> Rematched<'h> {
        if failed == self.fallback.name() {
            panic!("fallback grammar `{}` requested a rollback", failed);
        }
        let nested = BlockMatcher {
            hooks: self
                .hooks
                .iter()
                .copied()
                .filter(|h| h.name() != failed)
                .collect(),
            fallback: self.fallback,
        };

        let start = lines.first().map_or(0, |l| l.start);
        let root = arena.alloc(BlockToken::container(ROOT, start, start, ()));
        let mut state = MatchState {
            stack: vec![Frame {
                id: root,
                hook: None,
            }],
        };
        for line in lines {
            nested.process_line(&mut state, arena, ctx, line);
        }
        if finish {
            nested.close_frames_from(&mut state, arena, ctx, 1);
        }

        let children = arena.children(root).to_vec();
        arena.get_mut(root).children = Some(Vec::new());
        Rematched {
            children,
            open: state.stack.split_off(1),
        }
    }

    fn parent_info(&self, state: &MatchState<'h>, arena: &BlockArena, depth: usize) -> ParentInfo {
        let parent = arena.get(state.stack[depth - 1].id);
        ParentInfo {
            tokenizer: parent.tokenizer,
            start: parent.start,
        }
    }

    fn assert_progress(&self, hook: &dyn BlockTokenizer, from: usize, next: usize, token: &BlockToken) {
        assert!(
            next > from || token.is_container() && next >= from,
            "grammar `{}` reported an empty match at {}",
            hook.name(),
            from
        );
    }

    fn assert_consumed(&self, ctx: &BlockContext<'_>, line: &PhrasingLine, i: usize) {
        assert!(
            i == line.end,
            "line {:?} was not fully consumed (stopped at {} of {})",
            ctx.source(line.start, line.end),
            i,
            line.end
        );
    }
}

/// Move the cursor to the end of the line when only whitespace is left.
fn skip_blank_rest(ctx: &BlockContext<'_>, line: &PhrasingLine, i: usize) -> usize {
    let points = ctx.points();
    if line.advance(points, i).is_blank(points) {
        line.end
    } else {
        i
    }
}

fn refresh_end(arena: &mut BlockArena, parent: BlockId, child: BlockId) {
    let child_end = arena.get(child).end;
    let token = arena.get_mut(parent);
    if child_end > token.end {
        token.end = child_end;
    }
}

fn remove_last_child(arena: &mut BlockArena, parent: BlockId, child: BlockId) {
    let token = arena.get_mut(parent);
    if let Some(children) = token.children.as_mut()
        && children.last() == Some(&child)
    {
        children.pop();
        return;
    }
    panic!("token {} is not the last child of `{}`", child, token.tokenizer);
}

#[cfg(test)]
mod tests {
    //! Exercises the matcher with two toy grammars: a `>` container and a
    //! line-collecting fallback, plus a grammar that always rolls back.

    use super::*;
    use crate::parser::api::ParseContext;
    use crate::parser::chars::code_points;
    use crate::parser::lines::segment_lines;
    use crate::parser::registry::IdentifierRegistry;
    use crate::parser::tokenizer::{EatOpenerResult, Rollback};
    use crate::syntax::Node;

    struct Quote;
    struct Lines;
    struct Sticky;

    #[derive(Debug, Default)]
    struct Collected(Vec<PhrasingLine>);

    impl BlockTokenizer for Quote {
        fn name(&self) -> &'static str {
            "quote"
        }
        fn priority(&self) -> i32 {
            10
        }
        fn eat_opener(
            &self,
            line: &PhrasingLine,
            _parent: ParentInfo,
            ctx: &mut BlockContext<'_>,
        ) -> Option<EatOpenerResult> {
            let i = line.first_nonwhitespace;
            (i < line.end && ctx.points()[i].ch == '>').then(|| EatOpenerResult {
                token: BlockToken::container("quote", line.start, i + 1, ()),
                next_index: i + 1,
                saturated: false,
            })
        }
        fn eat_continuation_text(
            &self,
            line: &PhrasingLine,
            _token: &mut BlockToken,
            _parent: ParentInfo,
            ctx: &mut BlockContext<'_>,
        ) -> ContinuationStatus {
            let i = line.first_nonwhitespace;
            if i < line.end && ctx.points()[i].ch == '>' {
                ContinuationStatus::Opening { next_index: i + 1 }
            } else {
                ContinuationStatus::NotMatched
            }
        }
        fn parse_block(&self, _: &BlockToken, _: Vec<Node>, _: &ParseContext<'_>) -> Option<Node> {
            None
        }
    }

    impl BlockTokenizer for Lines {
        fn name(&self) -> &'static str {
            "lines"
        }
        fn priority(&self) -> i32 {
            -1
        }
        fn supports_lazy_continuation(&self) -> bool {
            true
        }
        fn eat_opener(
            &self,
            line: &PhrasingLine,
            _parent: ParentInfo,
            _ctx: &mut BlockContext<'_>,
        ) -> Option<EatOpenerResult> {
            Some(EatOpenerResult {
                token: BlockToken::leaf(
                    "lines",
                    line.first_nonwhitespace,
                    line.end,
                    Collected(vec![*line]),
                ),
                next_index: line.end,
                saturated: false,
            })
        }
        fn eat_continuation_text(
            &self,
            line: &PhrasingLine,
            token: &mut BlockToken,
            _parent: ParentInfo,
            ctx: &mut BlockContext<'_>,
        ) -> ContinuationStatus {
            if line.is_blank(ctx.points()) {
                return ContinuationStatus::NotMatched;
            }
            token.state_mut::<Collected>().0.push(*line);
            token.end = line.end;
            ContinuationStatus::Opening {
                next_index: line.end,
            }
        }
        fn eat_lazy_continuation_text(
            &self,
            line: &PhrasingLine,
            token: &mut BlockToken,
            parent: ParentInfo,
            ctx: &mut BlockContext<'_>,
        ) -> Option<usize> {
            match self.eat_continuation_text(line, token, parent, ctx) {
                ContinuationStatus::Opening { next_index } => Some(next_index),
                _ => None,
            }
        }
        fn parse_block(&self, _: &BlockToken, _: Vec<Node>, _: &ParseContext<'_>) -> Option<Node> {
            None
        }
    }

    /// Claims lines starting with `!` and gives them all back on close.
    impl BlockTokenizer for Sticky {
        fn name(&self) -> &'static str {
            "sticky"
        }
        fn priority(&self) -> i32 {
            5
        }
        fn eat_opener(
            &self,
            line: &PhrasingLine,
            _parent: ParentInfo,
            ctx: &mut BlockContext<'_>,
        ) -> Option<EatOpenerResult> {
            let i = line.first_nonwhitespace;
            (i < line.end && ctx.points()[i].ch == '!').then(|| EatOpenerResult {
                token: BlockToken::leaf("sticky", i, line.end, Collected(vec![*line])),
                next_index: line.end,
                saturated: false,
            })
        }
        fn eat_continuation_text(
            &self,
            line: &PhrasingLine,
            token: &mut BlockToken,
            _parent: ParentInfo,
            ctx: &mut BlockContext<'_>,
        ) -> ContinuationStatus {
            if line.is_blank(ctx.points()) {
                return ContinuationStatus::NotMatched;
            }
            token.state_mut::<Collected>().0.push(*line);
            ContinuationStatus::Opening {
                next_index: line.end,
            }
        }
        fn on_close(&self, token: &mut BlockToken, _ctx: &mut BlockContext<'_>) -> Option<Rollback> {
            Some(Rollback {
                lines: token.state::<Collected>().0.clone(),
                keep_token: false,
            })
        }
        fn parse_block(&self, _: &BlockToken, _: Vec<Node>, _: &ParseContext<'_>) -> Option<Node> {
            None
        }
    }

    /// Render the token tree as `name(children)` for compact assertions.
    fn shape(arena: &BlockArena, id: BlockId) -> String {
        let token = arena.get(id);
        match &token.children {
            Some(children) => {
                let inner: Vec<_> = children.iter().map(|&c| shape(arena, c)).collect();
                format!("{}({})", token.tokenizer, inner.join(","))
            }
            None => {
                let lines = token.try_state::<Collected>().map_or(0, |c| c.0.len());
                format!("{}[{}]", token.tokenizer, lines)
            }
        }
    }

    fn run(input: &str, hooks: Vec<&dyn BlockTokenizer>) -> String {
        let points = code_points(input);
        let lines = segment_lines(&points);
        let mut registry = IdentifierRegistry::new();
        let mut ctx = BlockContext::new(&points, &mut registry);
        let mut arena = BlockArena::new();
        let matcher = BlockMatcher::new(hooks, &Lines);
        let root = matcher.match_document(&lines, &mut arena, &mut ctx);
        shape(&arena, root)
    }

    #[test]
    fn container_lines_join_one_leaf() {
        assert_eq!(run("> a\n> b\n", vec![&Quote]), "root(quote(lines[2]))");
    }

    #[test]
    fn lazy_continuation_keeps_container_open() {
        assert_eq!(run("> a\nb\n", vec![&Quote]), "root(quote(lines[2]))");
    }

    #[test]
    fn blank_line_closes_unmatched_container() {
        assert_eq!(
            run("> a\n\nb\n", vec![&Quote]),
            "root(quote(lines[1]),lines[1])"
        );
    }

    #[test]
    fn nested_containers_open_in_one_line() {
        assert_eq!(
            run("> > a\n> b\n", vec![&Quote]),
            "root(quote(quote(lines[2])))"
        );
    }

    #[test]
    fn rollback_rematches_lines_without_the_failed_grammar() {
        let rolled = run("!a\n!b\n\nc\n", vec![&Quote, &Sticky]);
        let plain = run("!a\n!b\n\nc\n", vec![&Quote]);
        assert_eq!(rolled, "root(lines[2],lines[1])");
        assert_eq!(rolled, plain);
    }

    #[test]
    fn rollback_inside_container_splices_in_place() {
        assert_eq!(
            run("> !a\n> !b\n", vec![&Quote, &Sticky]),
            "root(quote(lines[2]))"
        );
    }

    #[test]
    fn root_end_covers_document() {
        let points = code_points("> a\n");
        let lines = segment_lines(&points);
        let mut registry = IdentifierRegistry::new();
        let mut ctx = BlockContext::new(&points, &mut registry);
        let mut arena = BlockArena::new();
        let hooks: Vec<&dyn BlockTokenizer> = vec![&Quote];
        let root = BlockMatcher::new(hooks, &Lines).match_document(&lines, &mut arena, &mut ctx);
        assert_eq!(arena.get(root).end, points.len());
        let quote = arena.children(root)[0];
        assert_eq!(arena.get(quote).end, 4);
    }
}
