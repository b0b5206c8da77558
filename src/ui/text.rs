//! Display-width helpers: clipping, truncation, word-wrap and
//! case-insensitive match spans.
//!
//! Widths are terminal columns (via `unicode-width`), span positions are
//! char indices.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Half-open char range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

const ELLIPSIS: char = '…';
const TAB_STOP: usize = 4;

/// Columns taken by one char. Control chars are drawn as a blank.
pub fn char_width(c: char) -> usize {
    if c.is_control() {
        1
    } else {
        c.width().unwrap_or(0)
    }
}

/// Char as drawn on screen
pub fn display_char(c: char) -> char {
    if c.is_control() {
        ' '
    } else {
        c
    }
}

pub fn width(s: &str) -> usize {
    s.width()
}

/// Replace tabs with spaces up to the next tab stop and blank other control chars
pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = 0;
    for c in s.chars() {
        if c == '\t' {
            let n = TAB_STOP - col % TAB_STOP;
            out.extend(std::iter::repeat(' ').take(n));
            col += n;
        } else {
            out.push(display_char(c));
            col += char_width(c);
        }
    }
    out
}

/// Longest prefix of `s` that fits in `max` columns
pub fn clip(s: &str, max: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = char_width(c);
        if used + w > max {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// `s` clipped and padded with spaces to exactly `max` columns
pub fn pad(s: &str, max: usize) -> String {
    let clipped = clip(s, max);
    let mut out = clipped.to_string();
    out.extend(std::iter::repeat(' ').take(max.saturating_sub(width(clipped))));
    out
}

/// `s` if it fits, otherwise clipped with a trailing ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    if width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = clip(s, max - 1).to_string();
    out.push(ELLIPSIS);
    out
}

/// Greedy word-wrap to `max` columns.
///
/// Words are packed with single spaces; a word wider than `max` is split
/// into `max`-column chunks. An empty or blank input gives one empty row.
/// No row is wider than `max`: a char that cannot fit at all (a double-width
/// char with `max == 1`) becomes `…`.
pub fn wrap(s: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return vec![String::new()];
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;

    for word in s.split_whitespace() {
        let word_width = width(word);

        if row_width > 0 && row_width + 1 + word_width <= max {
            row.push(' ');
            row.push_str(word);
            row_width += 1 + word_width;
            continue;
        }

        if row_width > 0 {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }

        if word_width <= max {
            row.push_str(word);
            row_width = word_width;
            continue;
        }

        // Hard split; the last chunk stays open for following words
        let mut rest = word;
        while width(rest) > max {
            let chunk = clip(rest, max);
            if chunk.is_empty() {
                // A char wider than the whole row is shown as an ellipsis
                let first = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
                rows.push(ELLIPSIS.to_string());
                rest = &rest[first..];
                continue;
            }
            rows.push(chunk.to_string());
            rest = &rest[chunk.len()..];
        }
        row.push_str(rest);
        row_width = width(rest);
    }

    if row_width > 0 || rows.is_empty() {
        rows.push(row);
    }
    rows
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let hay: Vec<char> = haystack.chars().map(fold).collect();
    let pat: Vec<char> = needle.chars().map(fold).collect();
    hay.windows(pat.len()).any(|w| w == pat.as_slice())
}

/// Non-overlapping case-insensitive occurrences of `needle`, left to right
pub fn match_spans(haystack: &str, needle: &str) -> Vec<Span> {
    let pat: Vec<char> = needle.chars().map(fold).collect();
    if pat.is_empty() {
        return Vec::new();
    }
    let hay: Vec<char> = haystack.chars().map(fold).collect();

    let mut spans = Vec::new();
    let mut i = 0;
    while i + pat.len() <= hay.len() {
        if hay[i..i + pat.len()] == pat[..] {
            spans.push(Span {
                start: i,
                end: i + pat.len(),
            });
            i += pat.len();
        } else {
            i += 1;
        }
    }
    spans
}
