use crate::parser::block_parser::tests::helpers::{assert_block_kinds, parse_plain};
use crate::syntax::NodeValue;

#[test]
fn blankline_between_paragraphs() {
    assert_block_kinds("Paragraph 1\n\nParagraph 2\n", &["paragraph", "paragraph"]);
}

#[test]
fn multiple_blanklines_between_paragraphs() {
    assert_block_kinds("Paragraph 1\n\n\n\nParagraph 2\n", &["paragraph", "paragraph"]);
}

#[test]
fn blankline_before_paragraph() {
    assert_block_kinds("\nParagraph 1\n", &["paragraph"]);
}

#[test]
fn whitespace_only_document() {
    assert_block_kinds("  \n\t\n\n", &[]);
    assert_block_kinds("", &[]);
}

#[test]
fn blankline_ends_blockquote() {
    assert_block_kinds("> a\n\n> b\n", &["blockquote", "blockquote"]);
}

#[test]
fn blankline_inside_fenced_code_is_kept() {
    let root = parse_plain("```\na\n\n\nb\n```\n");
    similar_asserts::assert_eq!(
        root.children[0].value,
        NodeValue::Code {
            lang: None,
            meta: None,
            value: "a\n\n\nb".to_string()
        }
    );
}

#[test]
fn blanklines_between_items_make_list_loose() {
    let root = parse_plain("- a\n\n\n- b\n");
    assert!(matches!(root.children[0].value, NodeValue::List { spread: true, .. }));
}
