//! Fenced code blocks.

use super::interrupt_with_opener;
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::trim_end;
use crate::parser::inline_parser::escapes;
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatInterruptResult, EatOpenerResult,
    ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const FENCED_CODE: &str = "fencedCode";

/// Information about a detected code fence opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FenceInfo {
    pub fence_char: char,
    pub fence_count: usize,
    pub info_string: String,
}

/// Try to detect a fenced code block opening; `content` starts at the first
/// non-whitespace character of the line.
pub(crate) fn try_parse_fence_open(content: &str) -> Option<FenceInfo> {
    let fence_char = match content.chars().next()? {
        c @ ('`' | '~') => c,
        _ => return None,
    };
    let fence_count = content.chars().take_while(|&c| c == fence_char).count();
    if fence_count < 3 {
        return None;
    }

    let info_string = content[fence_count..].trim().to_string();
    // A backtick in a backtick fence's info string would make it a code span.
    if fence_char == '`' && info_string.contains('`') {
        return None;
    }

    Some(FenceInfo {
        fence_char,
        fence_count,
        info_string,
    })
}

/// Check if a line is a valid closing fence for the given fence info.
pub(crate) fn is_closing_fence(content: &str, fence: &FenceInfo) -> bool {
    if !content.starts_with(fence.fence_char) {
        return false;
    }
    let closing_count = content
        .chars()
        .take_while(|&c| c == fence.fence_char)
        .count();
    if closing_count < fence.fence_count {
        return false;
    }
    content[closing_count..].trim().is_empty()
}

/// Split an info string into `lang` and `meta`, decoding escapes and entities.
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once([' ', '\t']) {
        Some((lang, meta)) => {
            let meta = meta.trim();
            let meta = (!meta.is_empty()).then(|| escapes::decode(meta));
            (Some(escapes::decode(lang)), meta)
        }
        None => (Some(escapes::decode(info)), None),
    }
}

#[derive(Debug)]
struct FencedCodeState {
    fence: FenceInfo,
    /// Indentation of the opening fence, removed from every content line.
    indent: usize,
    lines: Vec<PhrasingLine>,
}

#[derive(Debug, Default)]
pub struct FencedCodeTokenizer;

impl BlockTokenizer for FencedCodeTokenizer {
    fn name(&self) -> &'static str {
        FENCED_CODE
    }

    fn priority(&self) -> i32 {
        40
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
        let fence = try_parse_fence_open(&ctx.source(line.first_nonwhitespace, line.end))?;
        let points = ctx.points();
        let indent = line.count_of_preceding_space;
        let end = trim_end(points, line.first_nonwhitespace, line.end);

        log::trace!(
            "Code fence {}x{} info={:?}",
            fence.fence_char,
            fence.fence_count,
            fence.info_string
        );
        Some(EatOpenerResult {
            token: BlockToken::leaf(
                FENCED_CODE,
                line.first_nonwhitespace,
                end,
                FencedCodeState {
                    fence,
                    indent,
                    lines: Vec::new(),
                },
            ),
            next_index: line.end,
            saturated: false,
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

    fn eat_continuation_text(
        &self,
        line: &PhrasingLine,
        token: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> ContinuationStatus {
        let points = ctx.points();
        let state = token.state_mut::<FencedCodeState>();

        if line.count_of_preceding_space <= 3
            && is_closing_fence(&ctx.source(line.first_nonwhitespace, line.end), &state.fence)
        {
            token.end = trim_end(points, line.first_nonwhitespace, line.end);
            return ContinuationStatus::Closing {
                next_index: line.end,
            };
        }

        state.lines.push(line.skip_columns(points, state.indent));
        token.end = line.content_end(points).max(token.end);
        ContinuationStatus::Opening {
            next_index: line.end,
        }
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let state = token.state::<FencedCodeState>();
        let mut value: String = state
            .lines
            .iter()
            .map(|line| line.text(ctx.points()))
            .collect();
        if value.ends_with('\n') {
            value.pop();
        }
        let (lang, meta) = split_info_string(&state.fence.info_string);
        Some(Node::new(NodeValue::Code { lang, meta, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block_parser::tests::helpers::{block_kinds, parse_plain};

    fn code_value(input: &str) -> NodeValue {
        parse_plain(input).children[0].value.clone()
    }

    #[test]
    fn test_backtick_fence() {
        let fence = try_parse_fence_open("```rust\n").unwrap();
        assert_eq!(fence.fence_char, '`');
        assert_eq!(fence.fence_count, 3);
        assert_eq!(fence.info_string, "rust");
    }

    #[test]
    fn test_tilde_fence() {
        let fence = try_parse_fence_open("~~~~ python  ").unwrap();
        assert_eq!(fence.fence_char, '~');
        assert_eq!(fence.fence_count, 4);
        assert_eq!(fence.info_string, "python");
    }

    #[test]
    fn test_two_backticks_invalid() {
        assert!(try_parse_fence_open("``").is_none());
    }

    #[test]
    fn test_backtick_in_backtick_info_invalid() {
        assert!(try_parse_fence_open("``` a`b").is_none());
        assert!(try_parse_fence_open("~~~ a`b").is_some());
    }

    #[test]
    fn test_closing_fence() {
        let fence = try_parse_fence_open("````").unwrap();
        assert!(is_closing_fence("````\n", &fence));
        assert!(is_closing_fence("``````  ", &fence));
        assert!(!is_closing_fence("```", &fence));
        assert!(!is_closing_fence("```` x", &fence));
        assert!(!is_closing_fence("~~~~", &fence));
    }

    #[test]
    fn test_info_string_split() {
        assert_eq!(split_info_string(""), (None, None));
        assert_eq!(split_info_string("rust"), (Some("rust".into()), None));
        assert_eq!(
            split_info_string("js   title=\"a\\*b\""),
            (Some("js".into()), Some("title=\"a*b\"".into()))
        );
        assert_eq!(split_info_string("f&ouml;o"), (Some("föo".into()), None));
    }

    #[test]
    fn test_code_value() {
        assert_eq!(
            code_value("```rust\nfn main() {}\n\n  x\n```\n"),
            NodeValue::Code {
                lang: Some("rust".into()),
                meta: None,
                value: "fn main() {}\n\n  x".into(),
            }
        );
    }

    #[test]
    fn test_fence_indent_is_removed() {
        assert_eq!(
            code_value("  ```\n  a\n    b\nc\n  ```\n"),
            NodeValue::Code {
                lang: None,
                meta: None,
                value: "a\n  b\nc".into(),
            }
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert_eq!(block_kinds("```\n# not a heading\n\n> nor a quote\n"), vec!["code"]);
    }

    #[test]
    fn test_fence_ends_with_container() {
        let root = parse_plain("> ```\n> a\n\nb\n");
        assert_eq!(
            root.children.iter().map(|n| n.kind()).collect::<Vec<_>>(),
            vec!["blockquote", "paragraph"]
        );
        assert_eq!(
            root.children[0].children[0].value,
            NodeValue::Code {
                lang: None,
                meta: None,
                value: "a".into(),
            }
        );
    }

    #[test]
    fn test_fence_interrupts_paragraph() {
        assert_eq!(block_kinds("a\n```\nb\n```\n"), vec!["paragraph", "code"]);
    }

    #[test]
    fn test_empty_fence() {
        assert_eq!(
            code_value("```\n```\n"),
            NodeValue::Code {
                lang: None,
                meta: None,
                value: String::new(),
            }
        );
    }
}
