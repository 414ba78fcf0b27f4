//! Container nesting, laziness and interruption across grammars.

use crate::parser::block_parser::tests::helpers::{all_kinds, assert_block_kinds, parse_plain};
use crate::syntax::{Node, NodeValue};

#[test]
fn nested_blockquotes() {
    similar_asserts::assert_eq!(
        all_kinds("> > a\n"),
        vec!["blockquote", "blockquote", "paragraph", "text"]
    );
}

#[test]
fn lazy_paragraph_continuation_in_blockquote() {
    let root = parse_plain("> a\nb\n");
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].to_plain_text(), "a\nb");
}

#[test]
fn laziness_does_not_continue_code() {
    assert_block_kinds("> ```\n> a\nb\n", &["blockquote", "paragraph"]);
}

#[test]
fn thematic_break_is_not_lazy() {
    assert_block_kinds("> a\n---\n", &["blockquote", "thematicBreak"]);
}

#[test]
fn list_inside_blockquote() {
    similar_asserts::assert_eq!(
        all_kinds("> - a\n> - b\n"),
        vec![
            "blockquote",
            "list",
            "listItem",
            "paragraph",
            "text",
            "listItem",
            "paragraph",
            "text"
        ]
    );
}

#[test]
fn blockquote_inside_list_item() {
    similar_asserts::assert_eq!(
        all_kinds("- > a\n  > b\n"),
        vec!["list", "listItem", "blockquote", "paragraph", "text"]
    );
}

#[test]
fn list_item_continuation_by_indent() {
    let root = parse_plain("1. a\n\n   b\n2. c\n");
    let list = &root.children[0];
    assert_eq!(list.children.len(), 2);
    assert_eq!(list.children[0].children.len(), 2);
}

#[test]
fn fenced_code_interrupts_paragraph() {
    assert_block_kinds("a\n```\nb\n```\n", &["paragraph", "code"]);
}

#[test]
fn indented_code_cannot_interrupt_paragraph() {
    assert_block_kinds("a\n    b\n", &["paragraph"]);
}

#[test]
fn unterminated_fence_closes_at_end_of_input() {
    let root = parse_plain("```rust\nfn main() {}\n");
    assert_eq!(root.children[0].kind(), "code");
    assert_eq!(root.children.len(), 1);
}

fn code_value(node: &Node) -> &str {
    match &node.value {
        NodeValue::Code { value, .. } => value,
        other => panic!("expected code, got {:?}", other),
    }
}

#[test]
fn tab_after_container_counts_by_column() {
    similar_asserts::assert_eq!(
        all_kinds(" - foo\n   - bar\n\t - baz\n"),
        vec![
            "list",
            "listItem",
            "paragraph",
            "text",
            "list",
            "listItem",
            "paragraph",
            "text",
            "list",
            "listItem",
            "paragraph",
            "text"
        ]
    );
}

#[test]
fn split_tab_leaves_spaces_in_code() {
    let root = parse_plain(">\t\tfoo\n");
    assert_eq!(code_value(&root.children[0].children[0]), "  foo");

    let root = parse_plain("-\t\tfoo\n");
    assert_eq!(code_value(&root.children[0].children[0].children[0]), "  foo");
}
