//! Footnote definitions.
//!
//! ```markdown
//! [^id]: Footnote content here.
//!     Can continue on multiple lines
//!     as long as they're indented.
//! ```

use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::{is_space_or_tab, is_whitespace, trim_end};
use crate::parser::lines::PhrasingLine;
use crate::parser::registry::normalize_identifier;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const FOOTNOTE_DEFINITION: &str = "footnoteDefinition";

const CONTENT_INDENT: usize = 4;

/// Try to parse just the footnote marker `[^id]:` from a line.
/// Returns the label and the length of the marker in characters.
pub(crate) fn try_parse_footnote_marker(line: &str) -> Option<(String, usize)> {
    let rest = line.strip_prefix("[^")?;
    let close = rest.find(']')?;
    let label = &rest[..close];
    if label.is_empty()
        || label.chars().count() > 999
        || label.chars().any(|c| is_whitespace(c) || c == '[')
    {
        return None;
    }
    if !rest[close + 1..].starts_with(':') {
        return None;
    }
    Some((label.to_string(), label.chars().count() + 4))
}

#[derive(Debug)]
struct FootnoteState {
    label: String,
}

#[derive(Debug, Default)]
pub struct FootnoteDefinitionTokenizer;

impl BlockTokenizer for FootnoteDefinitionTokenizer {
    fn name(&self) -> &'static str {
        FOOTNOTE_DEFINITION
    }

    fn priority(&self) -> i32 {
        20
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        if ctx.is_interrupting_paragraph() || line.count_of_preceding_space > 3 {
            return None;
        }
        let (label, marker_len) =
            try_parse_footnote_marker(&ctx.source(line.first_nonwhitespace, line.end))?;
        let points = ctx.points();

        let mut next_index = line.first_nonwhitespace + marker_len;
        while next_index < line.end && is_space_or_tab(points[next_index].ch) {
            next_index += 1;
        }

        ctx.registry_mut().add_footnote(&label);
        log::trace!("Footnote definition [^{}]", label);
        Some(EatOpenerResult {
            token: BlockToken::container(
                FOOTNOTE_DEFINITION,
                line.first_nonwhitespace,
                trim_end(points, line.first_nonwhitespace, next_index),
                FootnoteState { label },
            ),
            next_index,
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
        let points = ctx.points();
        if line.is_blank(points) {
            return ContinuationStatus::Opening {
                next_index: line.start,
            };
        }
        if line.count_of_preceding_space < CONTENT_INDENT {
            return ContinuationStatus::NotMatched;
        }
        ContinuationStatus::Opening {
            next_index: ctx.skip_columns(line, CONTENT_INDENT),
        }
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        children: Vec<Node>,
        _ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let label = &token.state::<FootnoteState>().label;
        Some(Node::with_children(
            NodeValue::FootnoteDefinition {
                identifier: normalize_identifier(label),
                label: label.clone(),
            },
            children,
        ))
    }
}
