//! Link reference definitions.
//!
//! Reference definitions have the form:
//! ```markdown
//! [label]: url "optional title"
//! [label]: url 'optional title'
//! [label]: url (optional title)
//! [label]: <url> "title"
//! ```
//!
//! A definition collects lines like a paragraph and is only parsed once it
//! closes. Lines that do not form a definition are rolled back and matched
//! again without this grammar, so they become ordinary paragraph text.

use crate::parser::api::{BlockContext, ParseContext, PhrasingContent};
use crate::parser::chars::{NodePoint, trim_end};
use crate::parser::lines::PhrasingLine;
use crate::parser::link_parts::{
    label_text, scan_destination, scan_label, scan_title, skip_optional_line_break,
};
use crate::parser::registry::normalize_identifier;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatOpenerResult, ParentInfo, Rollback,
};
use crate::syntax::{Node, NodeValue};

pub const DEFINITION: &str = "definition";

/// A parsed reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReferenceDefinition {
    pub label: String,
    pub url: String,
    pub title: Option<String>,
}

/// Index after the line ending if only spaces or tabs remain on the line.
fn rest_of_line_blank(points: &[NodePoint], start: usize, end: usize) -> Option<usize> {
    let mut i = start;
    while i < end && matches!(points[i].ch, ' ' | '\t') {
        i += 1;
    }
    if i == end {
        Some(end)
    } else if points[i].ch == '\n' {
        Some(i + 1)
    } else {
        None
    }
}

/// Try to parse a reference definition at `start`. Returns the index after
/// the line the definition ends on, plus the definition.
pub(crate) fn try_parse_reference_definition(
    points: &[NodePoint],
    start: usize,
    end: usize,
) -> Option<(usize, ReferenceDefinition)> {
    let label_end = scan_label(points, start, end)?;
    if label_end >= end || points[label_end].ch != ':' {
        return None;
    }
    let label = label_text(points, start, label_end);

    let (dest_start, _) = skip_optional_line_break(points, label_end + 1, end);
    let (dest_end, url) = scan_destination(points, dest_start, end)?;

    // A title must be separated from the destination by whitespace.
    let (title_start, _) = skip_optional_line_break(points, dest_end, end);
    if title_start > dest_end
        && let Some((title_end, title)) = scan_title(points, title_start, end)
        && let Some(line_end) = rest_of_line_blank(points, title_end, end)
    {
        return Some((
            line_end,
            ReferenceDefinition {
                label,
                url,
                title: Some(title),
            },
        ));
    }

    let line_end = rest_of_line_blank(points, dest_end, end)?;
    Some((
        line_end,
        ReferenceDefinition {
            label,
            url,
            title: None,
        },
    ))
}

#[derive(Debug, Default)]
struct DefinitionState {
    lines: Vec<PhrasingLine>,
    definition: Option<ReferenceDefinition>,
}

impl DefinitionState {
    /// Parse the first definition. Returns it and the number of lines it spans.
    fn parse(&self, points: &[NodePoint]) -> Option<(ReferenceDefinition, usize)> {
        let content = PhrasingContent::from_lines(points, &self.lines)?;
        let merged = &content.points;
        let (end, definition) = try_parse_reference_definition(merged, 0, merged.len())?;

        let mut consumed = 0;
        let mut offset = 0;
        for line in &self.lines {
            if offset >= end {
                break;
            }
            offset += line.end - line.first_nonwhitespace;
            consumed += 1;
        }
        Some((definition, consumed))
    }

    /// Whether the collected lines are exactly one complete definition.
    fn is_complete(&self, points: &[NodePoint]) -> bool {
        self.parse(points)
            .is_some_and(|(_, consumed)| consumed == self.lines.len())
    }
}

#[derive(Debug, Default)]
pub struct DefinitionTokenizer;

impl BlockTokenizer for DefinitionTokenizer {
    fn name(&self) -> &'static str {
        DEFINITION
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
        // Definitions can not interrupt a paragraph.
        if ctx.is_interrupting_paragraph() || line.count_of_preceding_space > 3 {
            return None;
        }
        let points = ctx.points();
        if points[line.first_nonwhitespace].ch != '[' {
            return None;
        }
        let end = trim_end(points, line.first_nonwhitespace, line.end);
        Some(EatOpenerResult {
            token: BlockToken::leaf(
                DEFINITION,
                line.first_nonwhitespace,
                end,
                DefinitionState {
                    lines: vec![*line],
                    definition: None,
                },
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
        let points = ctx.points();
        if line.is_blank(points) {
            return ContinuationStatus::NotMatched;
        }

        let state = token.state_mut::<DefinitionState>();
        let starts_title = matches!(points[line.first_nonwhitespace].ch, '"' | '\'' | '(');
        if !starts_title && state.is_complete(points) {
            return ContinuationStatus::ClosingAndRollback { lines: Vec::new() };
        }

        state.lines.push(*line);
        token.end = trim_end(points, line.first_nonwhitespace, line.end);
        ContinuationStatus::Opening {
            next_index: line.end,
        }
    }

    fn on_close(&self, token: &mut BlockToken, ctx: &mut BlockContext<'_>) -> Option<Rollback> {
        let points = ctx.points();
        let state = token.state_mut::<DefinitionState>();

        let Some((definition, consumed)) = state.parse(points) else {
            log::trace!("No reference definition in {} lines", state.lines.len());
            return Some(Rollback {
                lines: std::mem::take(&mut state.lines),
                keep_token: false,
            });
        };

        ctx.registry_mut().add_definition(
            &definition.label,
            definition.url.clone(),
            definition.title.clone(),
        );
        state.definition = Some(definition);

        let rest = state.lines.split_off(consumed);
        let end = state
            .lines
            .last()
            .map(|last| trim_end(points, last.first_nonwhitespace, last.end));
        if let Some(end) = end {
            token.end = end;
        }
        if rest.is_empty() {
            None
        } else {
            Some(Rollback {
                lines: rest,
                keep_token: true,
            })
        }
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        _children: Vec<Node>,
        _ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        let definition = token.state::<DefinitionState>().definition.as_ref()?;
        Some(Node::new(NodeValue::Definition {
            identifier: normalize_identifier(&definition.label),
            label: definition.label.clone(),
            url: definition.url.clone(),
            title: definition.title.clone(),
        }))
    }
}
