//! Post-match rewrite of the block token tree.

use super::api::BlockContext;
use super::tokenizer::{BlockArena, BlockId, BlockTokenizer};

/// Visit containers in post-order and let every grammar rewrite each
/// container's child list. Grammars run in priority order; each sees the
/// output of the one before it.
pub fn post_match(
    root: BlockId,
    arena: &mut BlockArena,
    ctx: &mut BlockContext<'_>,
    hooks: &[&dyn BlockTokenizer],
) {
    let Some(children) = arena.get(root).children.clone() else {
        return;
    };
    for &child in &children {
        post_match(child, arena, ctx, hooks);
    }

    let mut siblings = children;
    for hook in hooks {
        siblings = hook.post_match(siblings, arena, ctx);
    }
    arena.get_mut(root).children = Some(siblings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::api::ParseContext;
    use crate::parser::chars::code_points;
    use crate::parser::lines::PhrasingLine;
    use crate::parser::registry::IdentifierRegistry;
    use crate::parser::tokenizer::{BlockToken, EatOpenerResult, ParentInfo};
    use crate::syntax::Node;

    /// Wraps every run of `item` siblings into one `group` container.
    struct Grouper;

    impl BlockTokenizer for Grouper {
        fn name(&self) -> &'static str {
            "grouper"
        }
        fn priority(&self) -> i32 {
            0
        }
        fn eat_opener(
            &self,
            _: &PhrasingLine,
            _: ParentInfo,
            _: &mut BlockContext<'_>,
        ) -> Option<EatOpenerResult> {
            None
        }
        fn post_match(
            &self,
            siblings: Vec<BlockId>,
            arena: &mut BlockArena,
            _ctx: &mut BlockContext<'_>,
        ) -> Vec<BlockId> {
            let mut out = Vec::new();
            let mut group: Option<BlockId> = None;
            for id in siblings {
                if arena.get(id).tokenizer != "item" {
                    group = None;
                    out.push(id);
                    continue;
                }
                let g = *group.get_or_insert_with(|| {
                    let start = arena.get(id).start;
                    let g = arena.alloc(BlockToken::container("group", start, start, ()));
                    out.push(g);
                    g
                });
                arena.append_child(g, id);
            }
            out
        }
        fn parse_block(&self, _: &BlockToken, _: Vec<Node>, _: &ParseContext<'_>) -> Option<Node> {
            None
        }
    }

    #[test]
    fn groups_runs_at_every_depth() {
        let points = code_points("");
        let mut registry = IdentifierRegistry::new();
        let mut ctx = BlockContext::new(&points, &mut registry);
        let mut arena = BlockArena::new();

        let root = arena.alloc(BlockToken::container("root", 0, 0, ()));
        let a = arena.alloc(BlockToken::container("item", 0, 1, ()));
        let inner = arena.alloc(BlockToken::leaf("item", 0, 1, ()));
        arena.append_child(a, inner);
        let b = arena.alloc(BlockToken::leaf("item", 1, 2, ()));
        let c = arena.alloc(BlockToken::leaf("other", 2, 3, ()));
        for id in [a, b, c] {
            arena.append_child(root, id);
        }

        let hooks: Vec<&dyn BlockTokenizer> = vec![&Grouper];
        post_match(root, &mut arena, &mut ctx, &hooks);

        let top = arena.children(root).to_vec();
        assert_eq!(top.len(), 2);
        assert_eq!(arena.get(top[0]).tokenizer, "group");
        assert_eq!(arena.children(top[0]), &[a, b]);
        assert_eq!(arena.get(top[0]).end, 2);
        // The nested item was grouped before its parent was visited.
        assert_eq!(arena.get(arena.children(a)[0]).tokenizer, "group");
    }
}
