//! Editor buffer - lines of chars, cursor and selection
//!
//! Each line is a `Vec<char>` so columns count Unicode scalar values, not
//! bytes. The buffer always holds at least one line and the cursor always
//! sits inside it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::FileError;

/// (line, col), ordered lexicographically
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Selection with its bounds normalized when it is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where the selection was started
    pub anchor: Position,
    pub start: Position,
    pub end: Position,
}

impl Selection {
    fn new(anchor: Position, cursor: Position) -> Self {
        Self {
            anchor,
            start: anchor.min(cursor),
            end: anchor.max(cursor),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Selected char range of `line` given its length, if it intersects
    pub fn columns_on(&self, line: usize, len: usize) -> Option<(usize, usize)> {
        if line < self.start.line || line > self.end.line {
            return None;
        }
        let from = if line == self.start.line { self.start.col } else { 0 };
        let to = if line == self.end.line { self.end.col } else { len };
        Some((from, to))
    }
}

/// Cursor motions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    PageUp(usize),
    PageDown(usize),
}

pub struct EditorBuffer {
    lines: Vec<Vec<char>>,
    cursor: Position,
    /// Column kept across vertical moves
    preferred_col: Option<usize>,
    selection: Option<Selection>,
    dirty: bool,
    file_name: Option<PathBuf>,
    /// Bumped on every text change
    revision: u64,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
            cursor: Position::default(),
            preferred_col: None,
            selection: None,
            dirty: false,
            file_name: None,
            revision: 0,
        }
    }

    /// Split on `\n`, dropping a `\r` before it
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).chars().collect())
            .collect();
        Self {
            lines,
            ..Self::new()
        }
    }

    /// Load `path`. A missing file gives an empty buffer bound to it.
    pub fn open(path: &Path) -> Result<Self, FileError> {
        let mut buffer = match fs::read(path) {
            Ok(bytes) => {
                info!("Opened {} ({} bytes)", path.display(), bytes.len());
                Self::from_text(&String::from_utf8_lossy(&bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("New file {}", path.display());
                Self::new()
            }
            Err(source) => {
                return Err(FileError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        buffer.file_name = Some(path.to_path_buf());
        Ok(buffer)
    }

    /// Write the lines joined by `\n` to the bound path
    pub fn save(&mut self) -> Result<usize, FileError> {
        let path = self.file_name.as_ref().ok_or(FileError::NoPath)?;
        let text = self.text();
        fs::write(path, &text).map_err(|source| FileError::Write {
            path: path.clone(),
            source,
        })?;
        info!("Saved {} ({} bytes)", path.display(), text.len());
        self.dirty = false;
        Ok(text.len())
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn lines(&self) -> &[Vec<char>] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> String {
        self.lines.get(idx).map(|l| l.iter().collect()).unwrap_or_default()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Active, non-empty selection
    pub fn selection(&self) -> Option<Selection> {
        self.selection.filter(|s| !s.is_empty())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, path: PathBuf) {
        self.file_name = Some(path);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn last_line(&self) -> usize {
        self.lines.len() - 1
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines[line].len()
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
        self.preferred_col = None;
    }

    /// Move the cursor. With `extend` the selection grows from where it was
    /// anchored (or from the current position); without it any selection is
    /// dropped.
    pub fn move_cursor(&mut self, motion: Motion, extend: bool) {
        let before = self.cursor;
        self.apply_motion(motion);

        if extend {
            let anchor = self.selection.map(|s| s.anchor).unwrap_or(before);
            self.selection = Some(Selection::new(anchor, self.cursor));
        } else {
            self.selection = None;
        }
    }

    fn apply_motion(&mut self, motion: Motion) {
        let Position { line, col } = self.cursor;
        match motion {
            Motion::Left => {
                if col > 0 {
                    self.cursor.col -= 1;
                } else if line > 0 {
                    self.cursor = Position::new(line - 1, self.line_len(line - 1));
                }
            }
            Motion::Right => {
                if col < self.line_len(line) {
                    self.cursor.col += 1;
                } else if line < self.last_line() {
                    self.cursor = Position::new(line + 1, 0);
                }
            }
            Motion::Up => self.move_vertical(line.saturating_sub(1)),
            Motion::Down => self.move_vertical((line + 1).min(self.last_line())),
            Motion::PageUp(rows) => self.move_vertical(line.saturating_sub(rows)),
            Motion::PageDown(rows) => self.move_vertical((line + rows).min(self.last_line())),
            Motion::LineStart => self.cursor.col = 0,
            Motion::LineEnd => self.cursor.col = self.line_len(line),
        }

        if !matches!(
            motion,
            Motion::Up | Motion::Down | Motion::PageUp(_) | Motion::PageDown(_)
        ) {
            self.preferred_col = None;
        }
    }

    fn move_vertical(&mut self, target: usize) {
        if target == self.cursor.line {
            return;
        }
        let want = *self.preferred_col.get_or_insert(self.cursor.col);
        self.cursor = Position::new(target, want.min(self.line_len(target)));
    }

    /// Select the text of the cursor line
    pub fn select_line(&mut self) {
        let line = self.cursor.line;
        let start = Position::new(line, 0);
        let end = Position::new(line, self.line_len(line));
        self.cursor = end;
        self.selection = Some(Selection::new(start, end));
    }

    pub fn select_all(&mut self) {
        let last = self.last_line();
        let end = Position::new(last, self.line_len(last));
        self.cursor = end;
        self.selection = Some(Selection::new(Position::default(), end));
    }

    /// Drop the selection without touching the text
    pub fn clear_selection(&mut self) -> bool {
        self.selection.take().is_some()
    }

    pub fn selected_text(&self) -> Option<String> {
        let sel = self.selection()?;
        let mut out = String::new();
        for line in sel.start.line..=sel.end.line {
            let (from, to) = sel.columns_on(line, self.line_len(line))?;
            out.extend(&self.lines[line][from..to]);
            if line < sel.end.line {
                out.push('\n');
            }
        }
        Some(out)
    }

    /// Remove the selected text and put the cursor at its start.
    /// Returns false when there was nothing to delete.
    pub fn delete_selection(&mut self) -> bool {
        let sel = match self.selection.take() {
            Some(sel) if !sel.is_empty() => sel,
            _ => return false,
        };
        let (start, end) = (sel.start, sel.end);

        if start.line == end.line {
            self.lines[start.line].drain(start.col..end.col);
        } else {
            let suffix = self.lines[end.line].split_off(end.col);
            self.lines[start.line].truncate(start.col);
            self.lines[start.line].extend(suffix);
            self.lines.drain(start.line + 1..=end.line);
        }
        if self.lines.is_empty() {
            self.lines.push(Vec::new());
        }

        debug!("Deleted selection {:?}..{:?}", start, end);
        self.cursor = start;
        self.touch();
        true
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        self.delete_selection();
        let Position { line, col } = self.cursor;
        self.lines[line].insert(col, c);
        self.cursor.col += 1;
        self.touch();
    }

    /// Split the line at the cursor
    pub fn insert_newline(&mut self) {
        self.delete_selection();
        let Position { line, col } = self.cursor;
        let rest = self.lines[line].split_off(col);
        self.lines.insert(line + 1, rest);
        self.cursor = Position::new(line + 1, 0);
        self.touch();
    }

    /// Insert text that may span several lines
    pub fn insert_text(&mut self, text: &str) {
        self.delete_selection();
        for c in text.chars().filter(|&c| c != '\r') {
            self.insert_char(c);
        }
    }

    /// Delete the rune before the cursor, joining with the previous line at column 0
    pub fn backspace(&mut self) {
        if self.delete_selection() {
            return;
        }
        let Position { line, col } = self.cursor;
        if col > 0 {
            self.lines[line].remove(col - 1);
            self.cursor.col -= 1;
        } else if line > 0 {
            let current = self.lines.remove(line);
            let join = self.line_len(line - 1);
            self.lines[line - 1].extend(current);
            self.cursor = Position::new(line - 1, join);
        } else {
            return;
        }
        self.touch();
    }

    /// Delete the rune after the cursor, joining with the next line at end of line
    pub fn delete(&mut self) {
        if self.delete_selection() {
            return;
        }
        let Position { line, col } = self.cursor;
        if col < self.line_len(line) {
            self.lines[line].remove(col);
        } else if line < self.last_line() {
            let next = self.lines.remove(line + 1);
            self.lines[line].extend(next);
        } else {
            return;
        }
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn buffer(lines: &[&str]) -> EditorBuffer {
        EditorBuffer::from_text(&lines.join("\n"))
    }

    fn lines(buf: &EditorBuffer) -> Vec<String> {
        (0..buf.line_count()).map(|i| buf.line(i)).collect()
    }

    fn at(buf: &mut EditorBuffer, line: usize, col: usize) {
        buf.cursor = Position::new(line, col);
    }

    #[test]
    fn test_from_text() {
        assert_eq!(lines(&EditorBuffer::from_text("")), [""]);
        assert_eq!(lines(&EditorBuffer::from_text("a\r\nb\n")), ["a", "b", ""]);
    }

    #[test]
    fn test_delete_joins_next_line() {
        let mut buf = buffer(&["ab", "cd"]);
        at(&mut buf, 0, 2);
        buf.delete();
        assert_eq!(lines(&buf), ["abcd"]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_backspace_joins_previous_line() {
        let mut buf = buffer(&["ab", "cd"]);
        at(&mut buf, 1, 0);
        buf.backspace();
        assert_eq!(lines(&buf), ["abcd"]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_edits_at_buffer_edges_are_noops() {
        let mut buf = buffer(&["ab"]);
        buf.backspace();
        at(&mut buf, 0, 2);
        buf.delete();
        assert_eq!(lines(&buf), ["ab"]);
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_select_line_then_delete() {
        let mut buf = buffer(&["hello", "world"]);
        buf.select_line();
        assert_eq!(buf.selected_text().as_deref(), Some("hello"));
        assert!(buf.delete_selection());
        assert_eq!(lines(&buf), ["", "world"]);
        assert_eq!(buf.cursor(), Position::new(0, 0));
    }

    #[test]
    fn test_select_all_then_delete_leaves_one_line() {
        let mut buf = buffer(&["one", "two", "three"]);
        buf.select_all();
        assert_eq!(buf.selected_text().as_deref(), Some("one\ntwo\nthree"));
        buf.delete_selection();
        assert_eq!(lines(&buf), [""]);
        assert_eq!(buf.cursor(), Position::new(0, 0));
    }

    #[test]
    fn test_multiline_selection_delete() {
        let mut buf = buffer(&["abcd", "efgh", "ijkl"]);
        at(&mut buf, 0, 2);
        buf.move_cursor(Motion::Down, true);
        buf.move_cursor(Motion::Down, true);
        buf.move_cursor(Motion::Right, true);
        let sel = buf.selection().unwrap();
        assert_eq!(sel.start, Position::new(0, 2));
        assert_eq!(sel.end, Position::new(2, 3));

        buf.delete_selection();
        assert_eq!(lines(&buf), ["abl"]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_selection_backwards_is_normalized() {
        let mut buf = buffer(&["abcd", "efgh"]);
        at(&mut buf, 1, 2);
        buf.move_cursor(Motion::Up, true);
        buf.move_cursor(Motion::Left, true);
        let sel = buf.selection().unwrap();
        assert_eq!(sel.anchor, Position::new(1, 2));
        assert_eq!(sel.start, Position::new(0, 1));
        assert_eq!(sel.end, Position::new(1, 2));
        assert_eq!(buf.selected_text().as_deref(), Some("bcd\nef"));
    }

    #[test]
    fn test_plain_motion_drops_selection() {
        let mut buf = buffer(&["abcd"]);
        buf.move_cursor(Motion::Right, true);
        assert!(buf.selection().is_some());
        buf.move_cursor(Motion::Right, false);
        assert!(buf.selection().is_none());
        assert_eq!(lines(&buf), ["abcd"]);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut buf = buffer(&["hello world"]);
        at(&mut buf, 0, 6);
        buf.move_cursor(Motion::LineEnd, true);
        buf.insert_char('X');
        assert_eq!(lines(&buf), ["hello X"]);
        assert_eq!(buf.cursor(), Position::new(0, 7));
    }

    #[test]
    fn test_newline_splits_line() {
        let mut buf = buffer(&["hello"]);
        at(&mut buf, 0, 2);
        buf.insert_newline();
        assert_eq!(lines(&buf), ["he", "llo"]);
        assert_eq!(buf.cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_insert_text_multiline() {
        let mut buf = buffer(&["[]"]);
        at(&mut buf, 0, 1);
        buf.insert_text("a\r\nb");
        assert_eq!(lines(&buf), ["[a", "b]"]);
        assert_eq!(buf.cursor(), Position::new(1, 1));
    }

    #[test]
    fn test_horizontal_motion_wraps_lines() {
        let mut buf = buffer(&["ab", "c"]);
        at(&mut buf, 0, 2);
        buf.move_cursor(Motion::Right, false);
        assert_eq!(buf.cursor(), Position::new(1, 0));
        buf.move_cursor(Motion::Left, false);
        assert_eq!(buf.cursor(), Position::new(0, 2));

        // Buffer edges
        at(&mut buf, 0, 0);
        buf.move_cursor(Motion::Left, false);
        assert_eq!(buf.cursor(), Position::new(0, 0));
        at(&mut buf, 1, 1);
        buf.move_cursor(Motion::Right, false);
        assert_eq!(buf.cursor(), Position::new(1, 1));
    }

    #[test]
    fn test_vertical_motion_clamps_and_remembers_column() {
        let mut buf = buffer(&["abcdef", "ab", "abcdef"]);
        at(&mut buf, 0, 5);
        buf.move_cursor(Motion::Down, false);
        assert_eq!(buf.cursor(), Position::new(1, 2));
        buf.move_cursor(Motion::Down, false);
        assert_eq!(buf.cursor(), Position::new(2, 5));
        buf.move_cursor(Motion::PageUp(10), false);
        assert_eq!(buf.cursor(), Position::new(0, 5));
    }

    #[test]
    fn test_multibyte_columns() {
        let mut buf = buffer(&["héllo"]);
        at(&mut buf, 0, 2);
        buf.backspace();
        assert_eq!(lines(&buf), ["hllo"]);
        buf.insert_char('日');
        assert_eq!(lines(&buf), ["h日llo"]);
        assert_eq!(buf.cursor(), Position::new(0, 2));
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");

        let mut buf = EditorBuffer::open(&path).unwrap();
        assert_eq!(lines(&buf), [""]);
        assert!(!path.exists());

        buf.insert_text("one\ntwo");
        assert!(buf.is_dirty());
        assert_eq!(buf.save().unwrap(), 7);
        assert!(!buf.is_dirty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo");

        let reopened = EditorBuffer::open(&path).unwrap();
        assert_eq!(lines(&reopened), ["one", "two"]);
    }

    #[test]
    fn test_save_without_path_is_an_error() {
        let mut buf = buffer(&["x"]);
        buf.insert_char('y');
        assert!(matches!(buf.save(), Err(FileError::NoPath)));
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_save_failure_keeps_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = EditorBuffer::new();
        buf.set_file_name(dir.path().join("missing").join("file.txt"));
        buf.insert_char('a');
        assert!(matches!(buf.save(), Err(FileError::Write { .. })));
        assert!(buf.is_dirty());
    }

    fn arb_buffer() -> impl Strategy<Value = (Vec<String>, usize, usize)> {
        prop::collection::vec("[a-zé ]{0,8}", 1..6).prop_flat_map(|lines| {
            let n = lines.len();
            (Just(lines), 0..n, 0usize..10)
        })
    }

    proptest! {
        #[test]
        fn prop_insert_then_backspace_is_identity((text, line, col) in arb_buffer(), c in "[a-z日]") {
            let mut buf = EditorBuffer::from_text(&text.join("\n"));
            let col = col.min(buf.lines()[line].len());
            at(&mut buf, line, col);

            buf.insert_char(c.chars().next().unwrap());
            buf.backspace();

            prop_assert_eq!(lines(&buf), text);
            prop_assert_eq!(buf.cursor(), Position::new(line, col));
            prop_assert!(buf.is_dirty());
        }

        #[test]
        fn prop_selection_delete_joins_lines(
            text in prop::collection::vec("[a-z]{0,8}", 2..8),
            a in 0usize..8, b in 0usize..8, ca in 0usize..10, cb in 0usize..10,
        ) {
            let n = text.len();
            let (i, j) = (a % n, b % n);
            prop_assume!(i < j);
            let mut buf = EditorBuffer::from_text(&text.join("\n"));
            let ci = ca.min(text[i].chars().count());
            let cj = cb.min(text[j].chars().count());

            at(&mut buf, i, ci);
            buf.selection = Some(Selection::new(Position::new(i, ci), Position::new(j, cj)));
            buf.delete_selection();

            let expected: String = text[i].chars().take(ci).chain(text[j].chars().skip(cj)).collect();
            prop_assert_eq!(buf.line_count(), n - (j - i));
            prop_assert_eq!(buf.line(i), expected);
            prop_assert_eq!(buf.cursor(), Position::new(i, ci));
        }
    }
}
