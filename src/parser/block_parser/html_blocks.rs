//! HTML blocks.

use std::sync::LazyLock;

use regex::Regex;

use super::interrupt_with_opener;
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatInterruptResult, EatOpenerResult,
    ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const HTML_BLOCK: &str = "htmlBlock";

/// HTML block-level tag names as listed by CommonMark.
/// These tags start an HTML block when found at the start of a line.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "base",
    "basefont",
    "blockquote",
    "body",
    "caption",
    "center",
    "col",
    "colgroup",
    "dd",
    "details",
    "dialog",
    "dir",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "frame",
    "frameset",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "head",
    "header",
    "hr",
    "html",
    "iframe",
    "legend",
    "li",
    "link",
    "main",
    "menu",
    "menuitem",
    "nav",
    "noframes",
    "ol",
    "optgroup",
    "option",
    "p",
    "param",
    "search",
    "section",
    "summary",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "title",
    "tr",
    "track",
    "ul",
];

/// Tags that contain raw/verbatim content (no Markdown processing inside).
const VERBATIM_TAGS: &[&str] = &["pre", "script", "style", "textarea"];

const TAG_NAME: &str = r"[A-Za-z][A-Za-z0-9-]*";
const ATTRIBUTE: &str = r#"\s+[A-Za-z_:][A-Za-z0-9_.:-]*(?:\s*=\s*(?:[^"'=<>`\x00-\x20]+|'[^']*'|"[^"]*"))?"#;

/// A complete open tag, e.g. `<a href="x">`.
pub(crate) fn open_tag_pattern() -> String {
    format!(r"<{TAG_NAME}(?:{ATTRIBUTE})*\s*/?>")
}

/// A complete closing tag, e.g. `</a >`.
pub(crate) fn closing_tag_pattern() -> String {
    format!(r"</{TAG_NAME}\s*>")
}

static COMPLETE_TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?:{}|{})[ \t]*\n?$",
        open_tag_pattern(),
        closing_tag_pattern()
    );
    Regex::new(&pattern).expect("complete tag regex is valid")
});

/// The seven kinds of HTML block start conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HtmlBlockType {
    /// `<pre>`, `<script>`, `<style>` or `<textarea>`, ends at the matching close tag.
    Verbatim(&'static str),
    /// HTML comment: <!-- ... -->
    Comment,
    /// Processing instruction: <? ... ?>
    ProcessingInstruction,
    /// Declaration: <!...>
    Declaration,
    /// CDATA section: <![CDATA[ ... ]]>
    CData,
    /// Known block-level tag, ends at a blank line.
    BlockTag,
    /// Any other complete tag alone on its line, ends at a blank line.
    OtherTag,
}

impl HtmlBlockType {
    fn ends_at_blank_line(&self) -> bool {
        matches!(self, Self::BlockTag | Self::OtherTag)
    }

    /// Check if a line contains the closing marker for this block type.
    fn is_closed_by(&self, line: &str) -> bool {
        match self {
            Self::Verbatim(tag) => line.to_ascii_lowercase().contains(&format!("</{}>", tag)),
            Self::Comment => line.contains("-->"),
            Self::ProcessingInstruction => line.contains("?>"),
            Self::Declaration => line.contains('>'),
            Self::CData => line.contains("]]>"),
            Self::BlockTag | Self::OtherTag => false,
        }
    }
}

/// Name of the tag right after `<` or `</`, lowercased.
fn tag_name_after(text: &str) -> Option<(String, &str)> {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(text.len());
    let name = &text[..end];
    if !name.chars().next()?.is_ascii_alphabetic() {
        return None;
    }
    Some((name.to_ascii_lowercase(), &text[end..]))
}

/// Try to detect an HTML block opening; `content` starts at the first
/// non-whitespace character of the line.
pub(crate) fn try_parse_html_block_start(
    content: &str,
    interrupting: bool,
) -> Option<HtmlBlockType> {
    let after_lt = content.strip_prefix('<')?;

    if after_lt.starts_with("!--") {
        return Some(HtmlBlockType::Comment);
    }
    if after_lt.starts_with('?') {
        return Some(HtmlBlockType::ProcessingInstruction);
    }
    if after_lt.starts_with("![CDATA[") {
        return Some(HtmlBlockType::CData);
    }
    if let Some(rest) = after_lt.strip_prefix('!') {
        return rest
            .starts_with(|c: char| c.is_ascii_alphabetic())
            .then_some(HtmlBlockType::Declaration);
    }

    let (closing, name_start) = match after_lt.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, after_lt),
    };
    let (name, rest) = tag_name_after(name_start)?;

    if !closing
        && let Some(tag) = VERBATIM_TAGS.iter().find(|t| **t == name)
        && (rest.is_empty() || rest.starts_with([' ', '\t', '\n', '>']))
    {
        return Some(HtmlBlockType::Verbatim(*tag));
    }

    if BLOCK_TAGS.contains(&name.as_str())
        && (rest.is_empty()
            || rest.starts_with([' ', '\t', '\n', '>'])
            || rest.starts_with("/>"))
    {
        return Some(HtmlBlockType::BlockTag);
    }

    if !interrupting
        && !VERBATIM_TAGS.contains(&name.as_str())
        && COMPLETE_TAG_LINE.is_match(content)
    {
        return Some(HtmlBlockType::OtherTag);
    }

    None
}

#[derive(Debug)]
struct HtmlBlockState {
    block_type: HtmlBlockType,
    lines: Vec<PhrasingLine>,
}

#[derive(Debug, Default)]
pub struct HtmlBlockTokenizer;

impl BlockTokenizer for HtmlBlockTokenizer {
    fn name(&self) -> &'static str {
        HTML_BLOCK
    }

    fn priority(&self) -> i32 {
        30
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
        let block_type = try_parse_html_block_start(&content, ctx.is_interrupting_paragraph())?;
        let saturated = block_type.is_closed_by(&content);

        log::trace!("HTML block {:?}, closed on first line: {}", block_type, saturated);
        Some(EatOpenerResult {
            token: BlockToken::leaf(
                HTML_BLOCK,
                line.first_nonwhitespace,
                line.content_end(ctx.points()),
                HtmlBlockState {
                    block_type,
                    lines: vec![*line],
                },
            ),
            next_index: line.end,
            saturated,
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
        let state = token.state_mut::<HtmlBlockState>();

        if state.block_type.ends_at_blank_line() {
            if line.is_blank(points) {
                return ContinuationStatus::NotMatched;
            }
            state.lines.push(*line);
            token.end = line.content_end(points);
            return ContinuationStatus::Opening {
                next_index: line.end,
            };
        }

        state.lines.push(*line);
        let closed = state.block_type.is_closed_by(&ctx.source(line.start, line.end));
        token.end = line.content_end(points).max(token.end);
        if closed {
            ContinuationStatus::Closing {
                next_index: line.end,
            }
        } else {
            ContinuationStatus::Opening {
                next_index: line.end,
            }
        }
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let state = token.state::<HtmlBlockState>();
        let mut value: String = state
            .lines
            .iter()
            .map(|line| ctx.source(line.start, line.end))
            .collect();
        if value.ends_with('\n') {
            value.pop();
        }
        Some(Node::new(NodeValue::Html { value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block_parser::tests::helpers::{block_kinds, parse_plain};

    fn html_value(input: &str) -> String {
        match &parse_plain(input).children[0].value {
            NodeValue::Html { value } => value.clone(),
            other => panic!("expected html, got {:?}", other),
        }
    }

    #[test]
    fn test_start_conditions() {
        assert_eq!(
            try_parse_html_block_start("<script type=\"x\">", false),
            Some(HtmlBlockType::Verbatim("script"))
        );
        assert_eq!(
            try_parse_html_block_start("<!-- c", false),
            Some(HtmlBlockType::Comment)
        );
        assert_eq!(
            try_parse_html_block_start("<?php", false),
            Some(HtmlBlockType::ProcessingInstruction)
        );
        assert_eq!(
            try_parse_html_block_start("<!DOCTYPE html>", false),
            Some(HtmlBlockType::Declaration)
        );
        assert_eq!(
            try_parse_html_block_start("<![CDATA[", false),
            Some(HtmlBlockType::CData)
        );
        assert_eq!(
            try_parse_html_block_start("<DIV class=\"a\"", false),
            Some(HtmlBlockType::BlockTag)
        );
        assert_eq!(
            try_parse_html_block_start("</td>", false),
            Some(HtmlBlockType::BlockTag)
        );
        assert_eq!(
            try_parse_html_block_start("<span id=\"x\">\n", false),
            Some(HtmlBlockType::OtherTag)
        );
    }

    #[test]
    fn test_non_starts() {
        assert_eq!(try_parse_html_block_start("<divx>", true), None);
        assert_eq!(try_parse_html_block_start("<span>", true), None);
        assert_eq!(try_parse_html_block_start("<span> text", false), None);
        assert_eq!(try_parse_html_block_start("<a href=\"x>", false), None);
        assert_eq!(try_parse_html_block_start("< div>", false), None);
        assert_eq!(try_parse_html_block_start("</pre>", false), None);
    }

    #[test]
    fn test_block_tag_ends_at_blank_line() {
        let root = parse_plain("<div>\n*a*\n\n*b*\n");
        assert_eq!(
            root.children.iter().map(|n| n.kind()).collect::<Vec<_>>(),
            vec!["html", "paragraph"]
        );
        assert_eq!(html_value("<div>\n*a*\n\n*b*\n"), "<div>\n*a*");
    }

    #[test]
    fn test_verbatim_block_spans_blank_lines() {
        assert_eq!(
            html_value("<pre>\na\n\nb\n</pre>\nafter\n"),
            "<pre>\na\n\nb\n</pre>"
        );
        assert_eq!(
            block_kinds("<pre>\na\n\nb\n</pre>\nafter\n"),
            vec!["html", "paragraph"]
        );
    }

    #[test]
    fn test_comment_closed_on_first_line() {
        assert_eq!(
            block_kinds("<!-- a -->\ntext\n"),
            vec!["html", "paragraph"]
        );
    }

    #[test]
    fn test_other_tag_cannot_interrupt_paragraph() {
        assert_eq!(block_kinds("a\n<span>\n"), vec!["paragraph"]);
        assert_eq!(block_kinds("a\n<div>\n"), vec!["paragraph", "html"]);
    }

    #[test]
    fn test_indentation_kept() {
        assert_eq!(html_value("  <div>\n"), "  <div>");
    }
}
