//! Lists and list items.
//!
//! Items are matched one at a time as containers. The post-match hook then
//! groups runs of compatible sibling items into list tokens and works out
//! whether each list is loose (`spread`).

use super::paragraphs::PARAGRAPH;
use crate::parser::api::{BlockContext, ParseContext};
use crate::parser::chars::{NodePoint, is_space_or_tab};
use crate::parser::lines::{PhrasingLine, column_width, virtual_column};
use crate::parser::tokenizer::{
    BlockArena, BlockId, BlockToken, BlockTokenizer, ContinuationStatus, EatInterruptResult,
    EatOpenerResult, ParentInfo,
};
use crate::syntax::{Node, NodeValue};

pub const LIST: &str = "list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListMarker {
    Bullet(char),
    Ordered { number: u64, delimiter: char },
}

impl ListMarker {
    fn is_compatible(&self, other: &ListMarker) -> bool {
        match (self, other) {
            (ListMarker::Bullet(a), ListMarker::Bullet(b)) => a == b,
            (
                ListMarker::Ordered { delimiter: a, .. },
                ListMarker::Ordered { delimiter: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    fn marker_char(&self) -> char {
        match self {
            ListMarker::Bullet(c) => *c,
            ListMarker::Ordered { delimiter, .. } => *delimiter,
        }
    }
}

/// Try to parse a list marker at the start of `content`. Returns the marker
/// and its length in characters.
pub(crate) fn try_parse_list_marker(content: &str) -> Option<(ListMarker, usize)> {
    let first = content.chars().next()?;
    let (marker, len) = match first {
        '-' | '+' | '*' => (ListMarker::Bullet(first), 1),
        '0'..='9' => {
            let digits = content.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits > 9 {
                return None;
            }
            let delimiter = content.chars().nth(digits)?;
            if !matches!(delimiter, '.' | ')') {
                return None;
            }
            let number = content[..digits].parse().ok()?;
            (ListMarker::Ordered { number, delimiter }, digits + 1)
        }
        _ => return None,
    };

    // Marker must be followed by whitespace or end of line
    match content.chars().nth(len) {
        None | Some(' ' | '\t' | '\n') => Some((marker, len)),
        _ => None,
    }
}

/// Try to parse a GFM task checkbox (`[ ]`, `[x]`, `[X]`) followed by whitespace.
pub(crate) fn try_parse_task_checkbox(content: &str) -> Option<bool> {
    let mut chars = content.chars();
    if chars.next()? != '[' {
        return None;
    }
    let checked = match chars.next()? {
        ' ' => false,
        'x' | 'X' => true,
        _ => return None,
    };
    if chars.next()? != ']' {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with([' ', '\t']) || rest.trim().is_empty() {
        return None;
    }
    Some(checked)
}

#[derive(Debug, Clone)]
struct ListItemState {
    marker: ListMarker,
    /// Columns of indentation that continuation lines must carry.
    padding: usize,
    checked: Option<bool>,
    /// The item started with a blank line after its marker.
    empty_start: bool,
    /// Set by post-match: a blank line separates two of the item's children.
    spread: bool,
}

#[derive(Debug, Clone)]
struct ListState {
    marker: ListMarker,
    spread: bool,
}

#[derive(Debug)]
pub struct ListTokenizer {
    task_lists: bool,
}

impl ListTokenizer {
    pub fn new(task_lists: bool) -> Self {
        Self { task_lists }
    }

    fn open_item(
        &self,
        line: &PhrasingLine,
        ctx: &mut BlockContext<'_>,
    ) -> Option<(BlockToken, usize, ListItemState)> {
        let points = ctx.points();
        let source = ctx.source(line.first_nonwhitespace, line.end);
        if line.count_of_preceding_space > 3 {
            return None;
        }
        let (marker, len) = try_parse_list_marker(&source)?;
        let marker_start = line.first_nonwhitespace;
        let marker_end = marker_start + len;

        let mut content = marker_end;
        while content < line.end && is_space_or_tab(points[content].ch) {
            content += 1;
        }
        let blank_rest = content >= line.end || points[content].ch == '\n';
        let spaces = column_width(points, line.line_start, marker_end, content);
        let marker_width = virtual_column(points, line.line_start, marker_end) - line.column;

        let (padding, next_index) = if blank_rest {
            (marker_width + 1, marker_end)
        } else if spaces >= 5 {
            // Content is indented code; only one column belongs to the marker.
            let after_marker = line.advance(points, marker_end);
            (marker_width + 1, ctx.skip_columns(&after_marker, 1))
        } else {
            (marker_width + spaces, content)
        };

        let mut checked = None;
        let mut next_index = next_index;
        if self.task_lists && !blank_rest && spaces < 5 {
            let rest: String = points[content..line.end].iter().map(|p| p.ch).collect();
            if let Some(is_checked) = try_parse_task_checkbox(&rest) {
                checked = Some(is_checked);
                next_index = content + 3;
                while next_index < line.end && is_space_or_tab(points[next_index].ch) {
                    next_index += 1;
                }
            }
        }

        let state = ListItemState {
            marker,
            padding,
            checked,
            empty_start: blank_rest,
            spread: false,
        };
        let token = BlockToken::container(LIST, marker_start, marker_end, state.clone());
        Some((token, next_index, state))
    }
}

impl Default for ListTokenizer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BlockTokenizer for ListTokenizer {
    fn name(&self) -> &'static str {
        LIST
    }

    fn priority(&self) -> i32 {
        60
    }

    fn eat_opener(
        &self,
        line: &PhrasingLine,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatOpenerResult> {
        let (token, next_index, _) = self.open_item(line, ctx)?;
        Some(EatOpenerResult {
            token,
            next_index,
            saturated: false,
        })
    }

    /// A list can interrupt a paragraph only with a non-empty item, and an
    /// ordered one only when it starts at 1.
    fn eat_and_interrupt_previous_sibling(
        &self,
        line: &PhrasingLine,
        previous: &mut BlockToken,
        _parent: ParentInfo,
        ctx: &mut BlockContext<'_>,
    ) -> Option<EatInterruptResult> {
        if !super::is_interruptible(previous) {
            return None;
        }
        let (token, next_index, state) = self.open_item(line, ctx)?;
        if state.empty_start {
            return None;
        }
        if let ListMarker::Ordered { number, .. } = state.marker
            && number != 1
            && previous.tokenizer == PARAGRAPH
        {
            return None;
        }
        Some(EatInterruptResult {
            token,
            next_index,
            saturated: false,
            keep_previous: true,
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
        let state = token.state::<ListItemState>();
        if line.is_blank(points) {
            let has_children = token.children.as_ref().is_some_and(|c| !c.is_empty());
            if state.empty_start && !has_children {
                return ContinuationStatus::NotMatched;
            }
            return ContinuationStatus::Opening {
                next_index: line.start,
            };
        }
        if line.count_of_preceding_space >= state.padding {
            let padding = state.padding;
            let next_index = ctx.skip_columns(line, padding);
            return ContinuationStatus::Opening { next_index };
        }
        ContinuationStatus::NotMatched
    }

    fn post_match(
        &self,
        siblings: Vec<BlockId>,
        arena: &mut BlockArena,
        ctx: &mut BlockContext<'_>,
    ) -> Vec<BlockId> {
        let points = ctx.points();
        let mut out = Vec::with_capacity(siblings.len());
        let mut current: Option<(BlockId, ListMarker)> = None;

        for id in siblings {
            let marker = arena
                .get(id)
                .try_state::<ListItemState>()
                .map(|state| state.marker);
            let Some(marker) = marker else {
                current = None;
                out.push(id);
                continue;
            };

            let list = match current {
                Some((list, first)) if first.is_compatible(&marker) => list,
                _ => {
                    let start = arena.get(id).start;
                    let list = arena.alloc(BlockToken::container(
                        LIST,
                        start,
                        start,
                        ListState {
                            marker,
                            spread: false,
                        },
                    ));
                    out.push(list);
                    current = Some((list, marker));
                    list
                }
            };
            arena.append_child(list, id);
        }

        for &id in &out {
            if arena.get(id).try_state::<ListState>().is_some() {
                mark_spread(id, arena, points);
            }
        }
        out
    }

    fn parse_block(
        &self,
        token: &BlockToken,
        children: Vec<Node>,
        _ctx: &ParseContext<'_>,
    ) -> Option<Node> {
        if let Some(list) = token.try_state::<ListState>() {
            let (ordered, start) = match list.marker {
                ListMarker::Bullet(_) => (false, None),
                ListMarker::Ordered { number, .. } => (true, Some(number)),
            };
            return Some(Node::with_children(
                NodeValue::List {
                    ordered,
                    start,
                    spread: list.spread,
                    marker: list.marker.marker_char(),
                },
                children,
            ));
        }

        let item = token.state::<ListItemState>();
        Some(Node::with_children(
            NodeValue::ListItem {
                spread: item.spread,
                checked: item.checked,
            },
            children,
        ))
    }
}

fn start_line(points: &[NodePoint], token: &BlockToken) -> usize {
    points.get(token.start).map_or(usize::MAX, |p| p.line)
}

fn end_line(points: &[NodePoint], token: &BlockToken) -> usize {
    let last = token.end.max(token.start + 1).min(points.len()).saturating_sub(1);
    points.get(last).map_or(0, |p| p.line)
}

/// Whether a blank line separates any two consecutive tokens of `ids`.
fn has_gap(points: &[NodePoint], arena: &BlockArena, ids: &[BlockId]) -> bool {
    ids.windows(2)
        .any(|w| start_line(points, arena.get(w[1])) > end_line(points, arena.get(w[0])) + 1)
}

/// Compute `spread` for a list token and each of its items.
fn mark_spread(list: BlockId, arena: &mut BlockArena, points: &[NodePoint]) {
    let items = arena.children(list).to_vec();
    let mut spread = has_gap(points, arena, &items);

    for &item in &items {
        let children = arena.children(item).to_vec();
        let item_spread = has_gap(points, arena, &children);
        spread |= item_spread;

        arena.get_mut(item).state_mut::<ListItemState>().spread = item_spread;
    }

    arena.get_mut(list).state_mut::<ListState>().spread = spread;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::block_parser::tests::helpers::{block_kinds, parse_plain};

    fn list_value(input: &str) -> NodeValue {
        parse_plain(input).children[0].value.clone()
    }

    #[test]
    fn test_bullet_markers() {
        assert_eq!(try_parse_list_marker("- a"), Some((ListMarker::Bullet('-'), 1)));
        assert_eq!(try_parse_list_marker("*\n"), Some((ListMarker::Bullet('*'), 1)));
        assert_eq!(try_parse_list_marker("-a"), None);
    }

    #[test]
    fn test_ordered_markers() {
        assert_eq!(
            try_parse_list_marker("12) x"),
            Some((
                ListMarker::Ordered {
                    number: 12,
                    delimiter: ')'
                },
                3
            ))
        );
        assert_eq!(try_parse_list_marker("1234567890. x"), None);
        assert_eq!(try_parse_list_marker("1: x"), None);
    }

    #[test]
    fn test_task_checkbox() {
        assert_eq!(try_parse_task_checkbox("[ ] todo"), Some(false));
        assert_eq!(try_parse_task_checkbox("[X] done"), Some(true));
        assert_eq!(try_parse_task_checkbox("[x]done"), None);
        assert_eq!(try_parse_task_checkbox("[x]  "), None);
    }

    #[test]
    fn test_items_merge_into_one_list() {
        let root = parse_plain("- a\n- b\n- c\n");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children.len(), 3);
        assert_eq!(
            root.children[0].value,
            NodeValue::List {
                ordered: false,
                start: None,
                spread: false,
                marker: '-',
            }
        );
    }

    #[test]
    fn test_marker_change_starts_new_list() {
        assert_eq!(block_kinds("- a\n+ b\n"), vec!["list", "list"]);
        assert_eq!(block_kinds("1. a\n2) b\n"), vec!["list", "list"]);
    }

    #[test]
    fn test_ordered_start() {
        assert_eq!(
            list_value("3. a\n4. b\n"),
            NodeValue::List {
                ordered: true,
                start: Some(3),
                spread: false,
                marker: '.',
            }
        );
    }

    #[test]
    fn test_blank_line_between_items_is_loose() {
        let NodeValue::List { spread, .. } = list_value("- a\n\n- b\n") else {
            panic!("expected list");
        };
        assert!(spread);
    }

    #[test]
    fn test_blank_line_inside_item_is_loose() {
        let root = parse_plain("- a\n\n  b\n- c\n");
        let list = &root.children[0];
        assert!(matches!(list.value, NodeValue::List { spread: true, .. }));
        assert!(matches!(
            list.children[0].value,
            NodeValue::ListItem { spread: true, .. }
        ));
        assert!(matches!(
            list.children[1].value,
            NodeValue::ListItem { spread: false, .. }
        ));
    }

    #[test]
    fn test_trailing_blank_line_keeps_list_tight() {
        let NodeValue::List { spread, .. } = list_value("- a\n- b\n\nc\n") else {
            panic!("expected list");
        };
        assert!(!spread);
    }

    #[test]
    fn test_nested_list() {
        let root = parse_plain("- a\n  - b\n");
        let item = &root.children[0].children[0];
        assert_eq!(
            item.children.iter().map(|n| n.kind()).collect::<Vec<_>>(),
            vec!["paragraph", "list"]
        );
    }

    #[test]
    fn test_ordered_list_interrupts_paragraph_only_from_one() {
        assert_eq!(block_kinds("a\n1. b\n"), vec!["paragraph", "list"]);
        assert_eq!(block_kinds("a\n2. b\n"), vec!["paragraph"]);
    }

    #[test]
    fn test_empty_item_cannot_interrupt_paragraph() {
        assert_eq!(block_kinds("a\n-\n"), vec!["heading"]);
        assert_eq!(block_kinds("a\n*\n"), vec!["paragraph"]);
    }

    #[test]
    fn test_empty_item_followed_by_blank_line_closes() {
        let root = parse_plain("-\n\n  foo\n");
        assert_eq!(
            root.children.iter().map(|n| n.kind()).collect::<Vec<_>>(),
            vec!["list", "paragraph"]
        );
    }

    #[test]
    fn test_task_items() {
        let root = parse_plain("- [x] done\n- [ ] todo\n- plain\n");
        let checked: Vec<_> = root.children[0]
            .children
            .iter()
            .map(|item| match item.value {
                NodeValue::ListItem { checked, .. } => checked,
                _ => panic!("expected item"),
            })
            .collect();
        assert_eq!(checked, vec![Some(true), Some(false), None]);
        assert_eq!(root.children[0].children[0].to_plain_text(), "done");
    }

    #[test]
    fn test_indented_code_in_item() {
        let root = parse_plain("-     code\n");
        let item = &root.children[0].children[0];
        assert_eq!(item.children[0].kind(), "code");
    }
}
