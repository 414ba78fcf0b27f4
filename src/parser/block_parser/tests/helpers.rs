use crate::parser::{ParseOptions, Parser};
use crate::syntax::Node;

/// Parse with the default grammar set, without positions.
pub(crate) fn parse_plain(input: &str) -> Node {
    Parser::default().parse(input, &ParseOptions::default())
}

/// Kinds of the top-level blocks.
pub(crate) fn block_kinds(input: &str) -> Vec<&'static str> {
    parse_plain(input).children.iter().map(|n| n.kind()).collect()
}

/// Kinds of every node in pre-order, root excluded.
pub(crate) fn all_kinds(input: &str) -> Vec<&'static str> {
    parse_plain(input)
        .descendants()
        .skip(1)
        .map(|n| n.kind())
        .collect()
}

pub(crate) fn assert_block_kinds(input: &str, expected: &[&str]) {
    similar_asserts::assert_eq!(block_kinds(input), expected);
}
