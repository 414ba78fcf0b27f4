//! Scanners for the pieces shared by link reference definitions and inline
//! links: labels, destinations and titles.
//!
//! All scanners work on `points[start..end]` and return the index just past
//! what they matched.

use super::chars::{NodePoint, collect_string, is_escaped, is_space_or_tab, is_whitespace};
use super::inline_parser::escapes;

const MAX_LABEL_LEN: usize = 999;
const MAX_PAREN_DEPTH: usize = 32;

/// Scan `[label]` starting at `start`. Returns the index after `]`.
pub fn scan_label(points: &[NodePoint], start: usize, end: usize) -> Option<usize> {
    if start >= end || points[start].ch != '[' {
        return None;
    }
    let mut i = start + 1;
    let mut has_content = false;
    while i < end {
        match points[i].ch {
            '\\' if i + 1 < end && points[i + 1].ch.is_ascii_punctuation() => {
                has_content = true;
                i += 2;
                continue;
            }
            '[' => return None,
            ']' => {
                return (has_content && i - start - 1 <= MAX_LABEL_LEN).then_some(i + 1);
            }
            c => {
                if !is_whitespace(c) {
                    has_content = true;
                }
            }
        }
        i += 1;
    }
    None
}

/// Raw text between the brackets of a label scanned by [`scan_label`].
pub fn label_text(points: &[NodePoint], start: usize, label_end: usize) -> String {
    collect_string(points, start + 1, label_end - 1)
}

/// Scan a link destination. Returns the index after it and the decoded URL.
pub fn scan_destination(points: &[NodePoint], start: usize, end: usize) -> Option<(usize, String)> {
    if start >= end {
        return None;
    }
    if points[start].ch == '<' {
        let mut i = start + 1;
        while i < end {
            match points[i].ch {
                '\n' | '<' => return None,
                '>' if !is_escaped(points, start + 1, i) => {
                    let raw = collect_string(points, start + 1, i);
                    return Some((i + 1, escapes::decode(&raw)));
                }
                _ => i += 1,
            }
        }
        return None;
    }

    let mut i = start;
    let mut depth = 0;
    while i < end {
        let c = points[i].ch;
        if c == '\\' && i + 1 < end && points[i + 1].ch.is_ascii_punctuation() {
            i += 2;
            continue;
        }
        if c.is_ascii_control() || c == ' ' {
            break;
        }
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_PAREN_DEPTH {
                    return None;
                }
            }
            ')' if depth == 0 => break,
            ')' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    if i == start || depth != 0 {
        return None;
    }
    let raw = collect_string(points, start, i);
    Some((i, escapes::decode(&raw)))
}

/// Scan a `"title"`, `'title'` or `(title)`. Returns the index after the
/// closing quote and the decoded title.
pub fn scan_title(points: &[NodePoint], start: usize, end: usize) -> Option<(usize, String)> {
    if start >= end {
        return None;
    }
    let close = match points[start].ch {
        '"' => '"',
        '\'' => '\'',
        '(' => ')',
        _ => return None,
    };
    let mut i = start + 1;
    let mut line_blank = false;
    while i < end {
        let c = points[i].ch;
        if c == '\\' && i + 1 < end && points[i + 1].ch.is_ascii_punctuation() {
            i += 2;
            line_blank = false;
            continue;
        }
        if c == close {
            let raw = collect_string(points, start + 1, i);
            return Some((i + 1, escapes::decode(&raw)));
        }
        if close == ')' && c == '(' {
            return None;
        }
        if c == '\n' {
            if line_blank {
                return None;
            }
            line_blank = true;
        } else if !is_space_or_tab(c) {
            line_blank = false;
        }
        i += 1;
    }
    None
}

/// Skip spaces and tabs and at most one line ending.
pub fn skip_optional_line_break(points: &[NodePoint], start: usize, end: usize) -> (usize, bool) {
    let mut i = start;
    let mut newline = false;
    while i < end {
        match points[i].ch {
            ' ' | '\t' => i += 1,
            '\n' if !newline => {
                newline = true;
                i += 1;
            }
            _ => break,
        }
    }
    (i, newline)
}
