//! GFM pipe tables.
//!
//! A table starts when a delimiter row follows a paragraph line with the same
//! number of cells. That paragraph line becomes the header row; earlier lines
//! of the paragraph stay a paragraph.

use super::blockquotes::try_parse_blockquote_marker;
use super::code_blocks::try_parse_fence_open;
use super::headings::try_parse_atx_heading;
use super::horizontal_rules::try_parse_horizontal_rule;
use super::paragraphs::{PARAGRAPH, ParagraphState};
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::{NodePoint, end_point, is_whitespace, start_point, trim_end};
use crate::parser::lines::PhrasingLine;
use crate::parser::tokenizer::{
    BlockToken, BlockTokenizer, ContinuationStatus, EatInterruptResult, EatOpenerResult,
    ParentInfo,
};
use crate::syntax::{AlignKind, Node, NodeValue, Position};

pub const TABLE: &str = "table";

/// A table row and its cell ranges, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRow {
    start: usize,
    end: usize,
    cells: Vec<(usize, usize)>,
}

/// Split `points[start..end]` into cells at unescaped pipes. A leading and a
/// trailing pipe are optional. Returns the row and whether it had any pipe.
fn split_row(points: &[NodePoint], start: usize, end: usize) -> (TableRow, bool) {
    let mut start = start;
    while start < end && is_whitespace(points[start].ch) {
        start += 1;
    }
    let end = trim_end(points, start, end);

    let trim_cell = |from: usize, to: usize| {
        let mut from = from;
        while from < to && is_whitespace(points[from].ch) {
            from += 1;
        }
        (from, trim_end(points, from, to))
    };

    let mut cells = Vec::new();
    let mut has_pipe = false;
    let mut cell_start = start;
    let mut i = start;
    while i < end {
        match points[i].ch {
            '\\' => i += 2,
            '|' => {
                has_pipe = true;
                if i > start {
                    cells.push(trim_cell(cell_start, i));
                }
                cell_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    if cell_start < end {
        cells.push(trim_cell(cell_start, end));
    }

    (TableRow { start, end, cells }, has_pipe)
}

/// Parse a delimiter row such as `| :--- | ---: |`.
fn parse_delimiter_row(points: &[NodePoint], line: &PhrasingLine) -> Option<(Vec<AlignKind>, bool)> {
    let (row, has_pipe) = split_row(points, line.first_nonwhitespace, line.end);
    if row.cells.is_empty() {
        return None;
    }
    let mut align = Vec::with_capacity(row.cells.len());
    for &(start, end) in &row.cells {
        let cell = &points[start..end];
        let left = cell.first().is_some_and(|p| p.ch == ':');
        let right = cell.len() > 1 && cell.last().is_some_and(|p| p.ch == ':');
        let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
        if dashes.is_empty() || dashes.iter().any(|p| p.ch != '-') {
            return None;
        }
        align.push(match (left, right) {
            (true, true) => AlignKind::Center,
            (true, false) => AlignKind::Left,
            (false, true) => AlignKind::Right,
            (false, false) => AlignKind::None,
        });
    }
    Some((align, has_pipe))
}

#[derive(Debug)]
struct TableState {
    align: Vec<AlignKind>,
    /// Header row first, the delimiter row is not kept.
    rows: Vec<TableRow>,
}

#[derive(Debug, Default)]
pub struct TableTokenizer;

impl TableTokenizer {
    /// Whether a body line starts another block instead of a row.
    fn starts_other_block(line: &PhrasingLine, ctx: &BlockContext<'_>) -> bool {
        if line.count_of_preceding_space > 3 {
            return false;
        }
        let content = ctx.source(line.first_nonwhitespace, line.end);
        try_parse_blockquote_marker(ctx.points(), line).is_some()
            || try_parse_atx_heading(&content).is_some()
            || try_parse_fence_open(&content).is_some()
            || try_parse_horizontal_rule(&content).is_some()
    }
}

impl BlockTokenizer for TableTokenizer {
    fn name(&self) -> &'static str {
        TABLE
    }

    fn priority(&self) -> i32 {
        100
    }

    /// Tables only ever start by taking over the last line of a paragraph.
    fn eat_opener(
        &self,
        _line: &PhrasingLine,
        _parent: ParentInfo,
        _ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        None
    }

    fn eat_and_interrupt_previous_sibling(
        &self,
        line: &PhrasingLine,
        previous: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatInterruptResult> {
        if previous.tokenizer != PARAGRAPH || line.count_of_preceding_space > 3 {
            return None;
        }
        let points = ctx.points();
        let (align, delimiter_has_pipe) = parse_delimiter_row(points, line)?;

        let paragraph = previous.state_mut::<ParagraphState>();
        let header_line = *paragraph.lines.last()?;
        let (header, header_has_pipe) =
            split_row(points, header_line.first_nonwhitespace, header_line.end);
        if header.cells.len() != align.len() || !(delimiter_has_pipe || header_has_pipe) {
            return None;
        }

        paragraph.lines.pop();
        let keep_previous = !paragraph.lines.is_empty();
        if let Some(end) = paragraph.content_end(points) {
            previous.end = end;
        }

        log::trace!("Table with {} columns", align.len());
        Some(EatInterruptResult {
            token: BlockToken::leaf(
                TABLE,
                header.start,
                trim_end(points, line.first_nonwhitespace, line.end),
                TableState {
                    align,
                    rows: vec![header],
                },
            ),
            next_index: line.end,
            saturated: false,
            keep_previous,
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
        if line.is_blank(points) || Self::starts_other_block(line, ctx) {
            return ContinuationStatus::NotMatched;
        }
        let (row, _) = split_row(points, line.first_nonwhitespace, line.end);
        token.end = row.end;
        token.state_mut::<TableState>().rows.push(row);
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
        let state = token.state::<TableState>();
        let points = ctx.points();
        let position = |start: usize, end: usize| Position {
            start: start_point(points, start),
            end: end_point(points, end),
        };

        let rows = state
            .rows
            .iter()
            .map(|row| {
                let cells = (0..state.align.len())
                    .map(|column| {
                        let (children, range) = match row.cells.get(column) {
                            Some(&(start, end)) => (ctx.parse_range(start, end), (start, end)),
                            None => (Vec::new(), (row.end, row.end)),
                        };
                        let mut cell = Node::with_children(NodeValue::TableCell, children);
                        cell.position = Some(position(range.0, range.1));
                        cell
                    })
                    .collect();
                let mut node = Node::with_children(NodeValue::TableRow, cells);
                node.position = Some(position(row.start, row.end));
                node
            })
            .collect();

        Some(Node::with_children(
            NodeValue::Table {
                align: state.align.clone(),
            },
            rows,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block_parser::tests::helpers::{block_kinds, parse_plain};
    use crate::parser::chars::{code_points, collect_string};
    use crate::parser::lines::segment_lines;

    fn cells(input: &str) -> Vec<String> {
        let points = code_points(input);
        let (row, _) = split_row(&points, 0, points.len());
        row.cells
            .iter()
            .map(|&(start, end)| collect_string(&points, start, end))
            .collect()
    }

    fn delimiter(input: &str) -> Option<Vec<AlignKind>> {
        let points = code_points(input);
        let line = segment_lines(&points)[0];
        parse_delimiter_row(&points, &line).map(|(align, _)| align)
    }

    fn cell_texts(table: &Node) -> Vec<Vec<String>> {
        table
            .children
            .iter()
            .map(|row| row.children.iter().map(|c| c.to_plain_text()).collect())
            .collect()
    }

    #[test]
    fn test_split_row() {
        assert_eq!(cells("| a | b |"), vec!["a", "b"]);
        assert_eq!(cells("a | b"), vec!["a", "b"]);
        assert_eq!(cells("| a \\| b |\n"), vec!["a \\| b"]);
        assert_eq!(cells("| a || c"), vec!["a", "", "c"]);
    }

    #[test]
    fn test_delimiter_row() {
        assert_eq!(
            delimiter("| :-- | --: | :-: | --- |"),
            Some(vec![
                AlignKind::Left,
                AlignKind::Right,
                AlignKind::Center,
                AlignKind::None
            ])
        );
        assert_eq!(delimiter("-|-"), Some(vec![AlignKind::None, AlignKind::None]));
        assert_eq!(delimiter("| -- x |"), None);
        assert_eq!(delimiter("| : |"), None);
    }

    #[test]
    fn test_simple_table() {
        let root = parse_plain("| a | b |\n| - | :- |\n| 1 | *2* |\n");
        let table = &root.children[0];
        assert_eq!(
            table.value,
            NodeValue::Table {
                align: vec![AlignKind::None, AlignKind::Left]
            }
        );
        assert_eq!(cell_texts(table), vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_rows_are_padded_and_truncated() {
        let root = parse_plain("a | b\n--|--\n1\n1 | 2 | 3\n");
        assert_eq!(
            cell_texts(&root.children[0]),
            vec![vec!["a", "b"], vec!["1", ""], vec!["1", "2"]]
        );
    }

    #[test]
    fn test_header_cell_count_must_match() {
        assert_eq!(block_kinds("| a | b |\n| - |\n"), vec!["paragraph"]);
    }

    #[test]
    fn test_table_takes_last_paragraph_line() {
        let root = parse_plain("intro\n| a |\n| - |\n");
        assert_eq!(
            root.children.iter().map(|n| n.kind()).collect::<Vec<_>>(),
            vec!["paragraph", "table"]
        );
        assert_eq!(root.children[0].to_plain_text(), "intro");
    }

    #[test]
    fn test_table_ends_at_blank_line_or_block_start() {
        assert_eq!(
            block_kinds("| a |\n| - |\n| 1 |\n\nafter\n"),
            vec!["table", "paragraph"]
        );
        assert_eq!(
            block_kinds("| a |\n| - |\n> quote\n"),
            vec!["table", "blockquote"]
        );
    }

    #[test]
    fn test_dash_line_without_pipes_is_setext() {
        assert_eq!(block_kinds("a\n---\n"), vec!["heading"]);
    }

    #[test]
    fn test_escaped_pipe_in_cell() {
        let root = parse_plain("| a \\| b |\n| --- |\n");
        assert_eq!(cell_texts(&root.children[0]), vec![vec!["a | b"]]);
    }
}
