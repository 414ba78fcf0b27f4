//! Code-point stream: the positioned character buffer every hook reads.

use crate::syntax::Point;

/// One code point of the source with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePoint {
    pub ch: char,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, counted in code points.
    pub column: usize,
    /// 0-based code-point offset in the source.
    pub offset: usize,
}

impl NodePoint {
    pub fn point(&self) -> Point {
        Point {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }
}

/// Convert source text into a positioned code-point stream.
///
/// `\r\n` and lone `\r` line endings are normalized to a single `\n` point
/// (the `\r` of a CRLF pair is dropped but still counted in offsets), and
/// U+0000 is replaced with U+FFFD.
pub fn code_points(input: &str) -> Vec<NodePoint> {
    let mut points = Vec::with_capacity(input.len());
    let mut line = 1;
    let mut column = 1;
    let mut chars = input.chars().enumerate().peekable();

    while let Some((offset, ch)) = chars.next() {
        let ch = match ch {
            '\0' => '\u{FFFD}',
            '\r' => {
                if matches!(chars.peek(), Some((_, '\n'))) {
                    continue;
                }
                '\n'
            }
            c => c,
        };
        points.push(NodePoint {
            ch,
            line,
            column,
            offset,
        });
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    points
}

/// Location just past the end of `points[..end]`.
pub fn end_point(points: &[NodePoint], end: usize) -> Point {
    if end == 0 {
        return points.first().map_or(
            Point {
                line: 1,
                column: 1,
                offset: 0,
            },
            NodePoint::point,
        );
    }
    let last = points[end - 1];
    if last.ch == '\n' {
        Point {
            line: last.line + 1,
            column: 1,
            offset: last.offset + 1,
        }
    } else {
        Point {
            line: last.line,
            column: last.column + 1,
            offset: last.offset + 1,
        }
    }
}

pub fn start_point(points: &[NodePoint], start: usize) -> Point {
    match points.get(start) {
        Some(p) => p.point(),
        None => end_point(points, points.len()),
    }
}

pub fn collect_string(points: &[NodePoint], start: usize, end: usize) -> String {
    points[start..end].iter().map(|p| p.ch).collect()
}

pub fn is_line_ending(c: char) -> bool {
    c == '\n'
}

/// Space or tab.
pub fn is_space_or_tab(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Whitespace as CommonMark defines it for block structure.
pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{000B}' | '\u{000C}')
}

pub fn is_unicode_whitespace(c: char) -> bool {
    c.is_whitespace()
}

pub fn is_ascii_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
}

/// Unicode punctuation or symbol, approximated from the general category
/// groups the standard library exposes.
pub fn is_punctuation(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    !c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()
}

/// Index of the first non-whitespace point at or after `start`.
pub fn skip_whitespace(points: &[NodePoint], start: usize, end: usize) -> usize {
    let mut i = start;
    while i < end && is_whitespace(points[i].ch) {
        i += 1;
    }
    i
}

pub fn skip_space_or_tab(points: &[NodePoint], start: usize, end: usize) -> usize {
    let mut i = start;
    while i < end && is_space_or_tab(points[i].ch) {
        i += 1;
    }
    i
}

/// Index just past the last non-whitespace point in `[start, end)`.
pub fn trim_end(points: &[NodePoint], start: usize, end: usize) -> usize {
    let mut i = end;
    while i > start && is_whitespace(points[i - 1].ch) {
        i -= 1;
    }
    i
}

/// Number of consecutive `ch` points starting at `start`.
pub fn count_run(points: &[NodePoint], start: usize, end: usize, ch: char) -> usize {
    points[start..end].iter().take_while(|p| p.ch == ch).count()
}

/// Whether the point at `index` is preceded by an odd number of backslashes.
pub fn is_escaped(points: &[NodePoint], start: usize, index: usize) -> bool {
    let mut backslashes = 0;
    let mut i = index;
    while i > start && points[i - 1].ch == '\\' {
        backslashes += 1;
        i -= 1;
    }
    backslashes % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let points = code_points("ab\ncd");
        assert_eq!(points.len(), 5);
        assert_eq!((points[1].line, points[1].column), (1, 2));
        assert_eq!((points[3].line, points[3].column), (2, 1));
        assert_eq!(points[4].offset, 4);
    }

    #[test]
    fn normalizes_crlf_and_cr() {
        let points = code_points("a\r\nb\rc");
        let text: String = points.iter().map(|p| p.ch).collect();
        assert_eq!(text, "a\nb\nc");
        // The CR of the CRLF pair is skipped but still occupies an offset.
        assert_eq!(points[1].offset, 2);
        assert_eq!(points[2].line, 2);
        assert_eq!(points[4].line, 3);
    }

    #[test]
    fn replaces_nul() {
        let points = code_points("a\0");
        assert_eq!(points[1].ch, '\u{FFFD}');
    }

    #[test]
    fn end_point_after_newline_moves_to_next_line() {
        let points = code_points("a\n");
        let end = end_point(&points, 2);
        assert_eq!((end.line, end.column, end.offset), (2, 1, 2));
        let end = end_point(&points, 1);
        assert_eq!((end.line, end.column, end.offset), (1, 2, 1));
    }

    #[test]
    fn escape_detection_counts_backslashes() {
        let points = code_points(r"\\*\*");
        assert!(!is_escaped(&points, 0, 2));
        assert!(is_escaped(&points, 0, 4));
    }
}
