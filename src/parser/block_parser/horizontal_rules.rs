//! Thematic breaks (horizontal rules).

use super::interrupt_with_opener;
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::trim_end;
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, EatInterruptResult, EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const THEMATIC_BREAK: &str = "thematicBreak";

/// Try to parse a horizontal rule from a line (indentation already checked).
///
/// A horizontal rule is 3 or more `*`, `-`, or `_` characters,
/// optionally separated by spaces or tabs.
pub(crate) fn try_parse_horizontal_rule(line: &str) -> Option<char> {
    let trimmed = line.trim();

    let rule_char = trimmed.chars().next()?;
    if !matches!(rule_char, '*' | '-' | '_') {
        return None;
    }

    let mut count = 0;
    for ch in trimmed.chars() {
        match ch {
            c if c == rule_char => count += 1,
            ' ' | '\t' => continue,
            _ => return None,
        }
    }

    if count >= 3 { Some(rule_char) } else { None }
}

#[derive(Debug, Default)]
pub struct ThematicBreakTokenizer;

impl BlockTokenizer for ThematicBreakTokenizer {
    fn name(&self) -> &'static str {
        THEMATIC_BREAK
    }

    fn priority(&self) -> i32 {
        80
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        if line.count_of_preceding_space > 3 {
            return None;
        }
        let content = ctx.source(line.first_nonwhitespace, line.end);
        try_parse_horizontal_rule(&content)?;
        let end = trim_end(ctx.points(), line.first_nonwhitespace, line.end);
        Some(EatOpenerResult {
            token: BlockToken::leaf(THEMATIC_BREAK, line.first_nonwhitespace, end, ()),
            next_index: line.end,
            saturated: true,
        })
    }

    fn eat_and_interrupt_previous_sibling(
        &self,
        line: &PhrasingLine,
        previous: &mut BlockToken,
        parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatInterruptResult> {
        interrupt_with_opener(self, line, previous, parent, ctx)
    }

    fn parse_block(
        &self,
        _token: &BlockToken,
        _children: Vec<Node>,
        _ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        Some(Node::new(NodeValue::ThematicBreak))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block_parser::tests::helpers::block_kinds;

    #[test]
    fn test_simple_rules() {
        assert_eq!(try_parse_horizontal_rule("---"), Some('-'));
        assert_eq!(try_parse_horizontal_rule("***\n"), Some('*'));
        assert_eq!(try_parse_horizontal_rule("_ _ _"), Some('_'));
    }

    #[test]
    fn test_not_enough_or_mixed() {
        assert_eq!(try_parse_horizontal_rule("--"), None);
        assert_eq!(try_parse_horizontal_rule("-*-"), None);
        assert_eq!(try_parse_horizontal_rule("--- a"), None);
    }

    #[test]
    fn test_rule_interrupts_paragraph() {
        assert_eq!(
            block_kinds("a\n***\nb\n"),
            vec!["paragraph", "thematicBreak", "paragraph"]
        );
    }

    #[test]
    fn test_rule_beats_list_item() {
        assert_eq!(block_kinds("* * *\n"), vec!["thematicBreak"]);
    }

    #[test]
    fn test_indented_rule_is_code() {
        assert_eq!(block_kinds("    ---\n"), vec!["code"]);
    }
}
