//! End-to-end inline parsing through the default grammar set.

use crate::parser::block_parser::tests::helpers::parse_plain;
use crate::syntax::{Node, NodeValue};

/// Inline children of the first block.
fn inline(input: &str) -> Vec<Node> {
    let mut root = parse_plain(input);
    assert!(!root.children.is_empty(), "no block parsed from {:?}", input);
    root.children.swap_remove(0).children
}

fn text(value: &str) -> Node {
    Node::text(value)
}

fn em(children: Vec<Node>) -> Node {
    Node::with_children(NodeValue::Emphasis, children)
}

fn strong(children: Vec<Node>) -> Node {
    Node::with_children(NodeValue::Strong, children)
}

fn link(url: &str, children: Vec<Node>) -> Node {
    Node::with_children(
        NodeValue::Link {
            url: url.to_string(),
            title: None,
        },
        children,
    )
}

mod emphasis_tests {
    use super::*;

    #[test]
    fn test_simple_emphasis_and_strong() {
        similar_asserts::assert_eq!(
            inline("*a* **b** _c_ __d__"),
            vec![
                em(vec![text("a")]),
                text(" "),
                strong(vec![text("b")]),
                text(" "),
                em(vec![text("c")]),
                text(" "),
                strong(vec![text("d")]),
            ]
        );
    }

    #[test]
    fn test_triple_delimiters() {
        similar_asserts::assert_eq!(inline("***a***"), vec![em(vec![strong(vec![text("a")])])]);
    }

    #[test]
    fn test_closer_remainder_keeps_pairing() {
        similar_asserts::assert_eq!(
            inline("**a *b** c*"),
            vec![em(vec![em(vec![text("a "), em(vec![text("b")])]), text(" c")])]
        );
    }

    #[test]
    fn test_unclosed_bracket_does_not_block_emphasis() {
        similar_asserts::assert_eq!(
            inline("*a [b* c"),
            vec![em(vec![text("a [b")]), text(" c")]
        );
    }

    #[test]
    fn test_link_resolves_before_emphasis() {
        similar_asserts::assert_eq!(
            inline("*[a*](b)"),
            vec![text("*"), link("b", vec![text("a*")])]
        );
    }

    #[test]
    fn test_intraword_underscore_is_literal() {
        similar_asserts::assert_eq!(inline("snake_case_word"), vec![text("snake_case_word")]);
    }

    #[test]
    fn test_mismatched_markers_stay_literal() {
        similar_asserts::assert_eq!(inline("*a_"), vec![text("*a_")]);
    }
}

mod code_and_html_tests {
    use super::*;

    #[test]
    fn test_code_span_is_opaque() {
        similar_asserts::assert_eq!(
            inline("`a*b`*"),
            vec![
                Node::new(NodeValue::InlineCode {
                    value: "a*b".to_string()
                }),
                text("*"),
            ]
        );
    }

    #[test]
    fn test_raw_html_passes_through() {
        similar_asserts::assert_eq!(
            inline("a <b>c</b>"),
            vec![
                text("a "),
                Node::new(NodeValue::Html {
                    value: "<b>".to_string()
                }),
                text("c"),
                Node::new(NodeValue::Html {
                    value: "</b>".to_string()
                }),
            ]
        );
    }

    #[test]
    fn test_escapes_and_entities() {
        similar_asserts::assert_eq!(inline("\\*a\\* &amp;"), vec![text("*a* &")]);
    }
}

mod link_tests {
    use super::*;

    #[test]
    fn test_inline_link_with_title() {
        similar_asserts::assert_eq!(
            inline("[a](/u \"t\")"),
            vec![Node::with_children(
                NodeValue::Link {
                    url: "/u".to_string(),
                    title: Some("t".to_string()),
                },
                vec![text("a")],
            )]
        );
    }

    #[test]
    fn test_links_do_not_nest() {
        similar_asserts::assert_eq!(
            inline("[a [b](/c)](/d)"),
            vec![text("[a "), link("/c", vec![text("b")]), text("](/d)")]
        );
    }

    #[test]
    fn test_image_alt_is_plain_text() {
        similar_asserts::assert_eq!(
            inline("![alt *x*](/img)"),
            vec![Node::new(NodeValue::Image {
                url: "/img".to_string(),
                alt: "alt x".to_string(),
                title: None,
            })]
        );
    }

    #[test]
    fn test_autolinks() {
        similar_asserts::assert_eq!(
            inline("<https://x.y> www.a.com"),
            vec![
                link("https://x.y", vec![text("https://x.y")]),
                text(" "),
                link("http://www.a.com", vec![text("www.a.com")]),
            ]
        );
    }

    #[test]
    fn test_url_destinations_are_links() {
        similar_asserts::assert_eq!(
            inline("[x](https://a.b) [a](mailto:a@b.c)"),
            vec![
                link("https://a.b", vec![text("x")]),
                text(" "),
                link("mailto:a@b.c", vec![text("a")]),
            ]
        );
        similar_asserts::assert_eq!(
            inline("![x](http://a.b/c.png)"),
            vec![Node::new(NodeValue::Image {
                url: "http://a.b/c.png".to_string(),
                alt: "x".to_string(),
                title: None,
            })]
        );
    }

    #[test]
    fn test_literal_autolink_in_link_text_stays_text() {
        similar_asserts::assert_eq!(
            inline("[www.a.com](/u) and www.b.com"),
            vec![
                link("/u", vec![text("www.a.com")]),
                text(" and "),
                link("http://www.b.com", vec![text("www.b.com")]),
            ]
        );
    }

    #[test]
    fn test_image_around_nested_links() {
        similar_asserts::assert_eq!(
            inline("![[[foo](uri1)](uri2)](uri3)"),
            vec![Node::new(NodeValue::Image {
                url: "uri3".to_string(),
                alt: "[foo](uri2)".to_string(),
                title: None,
            })]
        );
    }

    #[test]
    fn test_label_after_inner_link_is_shortcut() {
        similar_asserts::assert_eq!(
            inline("[foo [bar](/uri)][ref]\n\n[ref]: /uri"),
            vec![
                text("[foo "),
                link("/uri", vec![text("bar")]),
                text("]"),
                link("/uri", vec![text("ref")]),
            ]
        );
    }

    #[test]
    fn test_escaped_angle_is_text() {
        similar_asserts::assert_eq!(inline("\\<div> not html"), vec![text("<div> not html")]);
        similar_asserts::assert_eq!(inline("\\<https://a.b>"), vec![text("<https://a.b>")]);
    }

    #[test]
    fn test_unresolved_reference_is_text() {
        similar_asserts::assert_eq!(inline("[nope]"), vec![text("[nope]")]);
    }
}

mod break_tests {
    use super::*;

    #[test]
    fn test_hard_breaks() {
        similar_asserts::assert_eq!(
            inline("a  \nb\\\nc"),
            vec![
                text("a"),
                Node::new(NodeValue::Break),
                text("b"),
                Node::new(NodeValue::Break),
                text("c"),
            ]
        );
    }

    #[test]
    fn test_soft_break_stays_in_text() {
        similar_asserts::assert_eq!(inline("a \n  b"), vec![text("a\nb")]);
    }

    #[test]
    fn test_strikethrough() {
        similar_asserts::assert_eq!(
            inline("~~a~~ ~b~ ~~c~"),
            vec![
                Node::with_children(NodeValue::Delete, vec![text("a")]),
                text(" "),
                Node::with_children(NodeValue::Delete, vec![text("b")]),
                text(" ~~c~"),
            ]
        );
    }
}
