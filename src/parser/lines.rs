//! Line segmentation over the code-point stream.

use super::chars::{NodePoint, is_space_or_tab, is_whitespace};

const TAB_STOP: usize = 4;

/// A (possibly partially consumed) source line as seen by block hooks.
///
/// `start` is the current cursor, `end` is exclusive and includes the
/// trailing line ending when there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhrasingLine {
    /// Index of the physical start of the line, used to compute tab stops.
    pub line_start: usize,
    pub start: usize,
    pub end: usize,
    pub first_nonwhitespace: usize,
    /// Leading space before `first_nonwhitespace`, in columns with tabs expanded.
    pub count_of_preceding_space: usize,
    /// Virtual column of the cursor. Larger than the column of `start` when
    /// part of a tab at `start` has already been consumed.
    pub column: usize,
}

impl PhrasingLine {
    pub fn new(points: &[NodePoint], line_start: usize, start: usize, end: usize) -> Self {
        let column = virtual_column(points, line_start, start);
        Self::at_column(points, line_start, start, end, column)
    }

    /// A line whose cursor sits at `column`, possibly inside the tab at `start`.
    pub fn at_column(
        points: &[NodePoint],
        line_start: usize,
        start: usize,
        end: usize,
        column: usize,
    ) -> Self {
        let mut first = start;
        while first < end && is_space_or_tab(points[first].ch) {
            first += 1;
        }
        let column = column.max(virtual_column(points, line_start, start));
        let count = virtual_column(points, line_start, first).saturating_sub(column);
        Self {
            line_start,
            start,
            end,
            first_nonwhitespace: first,
            count_of_preceding_space: count,
            column,
        }
    }

    /// The same physical line with the cursor moved to `start`.
    pub fn advance(&self, points: &[NodePoint], start: usize) -> Self {
        Self::new(points, self.line_start, start.min(self.end), self.end)
    }

    /// Consume up to `columns` columns of leading whitespace. A tab wider
    /// than what is left is split: the cursor stays on it with a larger
    /// `column`.
    pub fn skip_columns(&self, points: &[NodePoint], columns: usize) -> Self {
        let target = self.column + columns;
        let mut i = self.start;
        let mut column = self.column;
        while i < self.end && column < target && is_space_or_tab(points[i].ch) {
            let next = virtual_column(points, self.line_start, i + 1);
            if next <= target {
                column = next;
                i += 1;
            } else {
                column = target;
            }
        }
        Self::at_column(points, self.line_start, i, self.end, column)
    }

    /// Source text from the cursor, with the unconsumed part of a split tab
    /// written out as spaces.
    pub fn text(&self, points: &[NodePoint]) -> String {
        let mut text = String::new();
        let mut start = self.start;
        if start < self.end
            && points[start].ch == '\t'
            && self.column > virtual_column(points, self.line_start, start)
        {
            let rest = virtual_column(points, self.line_start, start + 1) - self.column;
            text.extend(std::iter::repeat_n(' ', rest));
            start += 1;
        }
        text.extend(points[start..self.end].iter().map(|p| p.ch));
        text
    }

    /// Whether nothing but whitespace remains after the cursor.
    pub fn is_blank(&self, points: &[NodePoint]) -> bool {
        points[self.first_nonwhitespace..self.end]
            .iter()
            .all(|p| is_whitespace(p.ch))
    }

    /// End index with the trailing line ending excluded.
    pub fn content_end(&self, points: &[NodePoint]) -> usize {
        if self.end > self.start && points[self.end - 1].ch == '\n' {
            self.end - 1
        } else {
            self.end
        }
    }
}

/// Virtual column at `index`, counted from `line_start` with tabs expanded.
pub fn virtual_column(points: &[NodePoint], line_start: usize, index: usize) -> usize {
    column_width(points, line_start, line_start, index)
}

/// Column width of `points[from..to]` given the line starts at `line_start`.
pub fn column_width(points: &[NodePoint], line_start: usize, from: usize, to: usize) -> usize {
    let mut col = 0;
    let mut width = 0;
    for (i, p) in points[line_start..to].iter().enumerate() {
        let step = if p.ch == '\t' {
            TAB_STOP - (col % TAB_STOP)
        } else {
            1
        };
        col += step;
        if line_start + i >= from {
            width += step;
        }
    }
    width
}

/// Split the stream into physical lines (half-open, including the newline).
pub fn segment_lines(points: &[NodePoint]) -> Vec<PhrasingLine> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, p) in points.iter().enumerate() {
        if p.ch == '\n' {
            lines.push(PhrasingLine::new(points, start, start, i + 1));
            start = i + 1;
        }
    }
    if start < points.len() {
        lines.push(PhrasingLine::new(points, start, start, points.len()));
    }
    lines
}
