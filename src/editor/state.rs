//! Editor controller - key bindings, viewport and the quit prompt
//!
//! Owns the buffer and the clipboard. Like the pager state it never touches
//! the terminal: `handle_key` mutates the model and reports what to redraw.

use tracing::{info, warn};

use super::buffer::{EditorBuffer, Motion, Selection};
use super::clipboard::Clipboard;
use crate::core::input::{Direction, KeyEvent};
use crate::ui::{text, Damage};

const KEY_HINTS: &str =
    "^S save | ^Q quit | ^A all | ^L line | ^C copy | ^X cut | ^V paste | Shift+arrows select";
const QUIT_PROMPT: &str = "Unsaved changes: (s)ave, (d)iscard, (c)ancel?";
const MIN_GUTTER: usize = 3;

/// Startup options
#[derive(Debug, Clone)]
pub struct EditorOptions {
    /// Spaces inserted by Tab
    pub tab_width: usize,
    pub line_numbers: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            tab_width: 4,
            line_numbers: true,
        }
    }
}

/// Result of handling one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue(Damage),
    Quit,
}

pub struct Editor {
    buffer: EditorBuffer,
    clipboard: Clipboard,
    options: EditorOptions,
    /// First buffer line on screen
    scroll_top: usize,
    /// First char column on screen
    scroll_left: usize,
    text_rows: usize,
    width: usize,
    message: Option<String>,
    /// Waiting for a save/discard/cancel answer
    quit_prompt: bool,
}

impl Editor {
    pub fn new(buffer: EditorBuffer, clipboard: Clipboard, options: EditorOptions) -> Self {
        Self {
            buffer,
            clipboard,
            options,
            scroll_top: 0,
            scroll_left: 0,
            text_rows: 1,
            width: 80,
            message: None,
            quit_prompt: false,
        }
    }

    pub fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn scroll_left(&self) -> usize {
        self.scroll_left
    }

    pub fn text_rows(&self) -> usize {
        self.text_rows
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn is_prompting(&self) -> bool {
        self.quit_prompt
    }

    /// Columns taken by the line-number gutter, separator included
    pub fn gutter_width(&self) -> usize {
        if !self.options.line_numbers {
            return 0;
        }
        let digits = self.buffer.line_count().to_string().len();
        digits.max(MIN_GUTTER) + 1
    }

    /// Columns left for text
    pub fn text_cols(&self) -> usize {
        self.width.saturating_sub(self.gutter_width()).max(1)
    }

    /// Lay out for a `width` x `text_rows` text area
    pub fn resize(&mut self, width: u16, text_rows: usize) {
        self.width = width as usize;
        self.text_rows = text_rows.max(1);
        self.scroll_to_cursor();
    }

    /// Adjust the viewport so the cursor cell is on screen
    pub fn scroll_to_cursor(&mut self) {
        let cursor = self.buffer.cursor();

        if cursor.line < self.scroll_top {
            self.scroll_top = cursor.line;
        } else if cursor.line >= self.scroll_top + self.text_rows {
            self.scroll_top = cursor.line + 1 - self.text_rows;
        }

        let cols = self.text_cols();
        let line = &self.buffer.lines()[cursor.line];
        if cursor.col < self.scroll_left {
            self.scroll_left = cursor.col;
        }
        while self.scroll_left < cursor.col && columns(&line[self.scroll_left..cursor.col]) >= cols {
            self.scroll_left += 1;
        }
    }

    /// Cursor position relative to the text area, in screen cells
    pub fn cursor_cell(&self) -> (usize, usize) {
        let cursor = self.buffer.cursor();
        let line = &self.buffer.lines()[cursor.line];
        let from = self.scroll_left.min(cursor.col);
        (
            cursor.line.saturating_sub(self.scroll_top),
            self.gutter_width() + columns(&line[from..cursor.col]),
        )
    }

    /// File name, dirty marker and cursor position
    pub fn status_line(&self) -> String {
        let name = self
            .buffer
            .file_name()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "[No Name]".to_string());
        let dirty = if self.buffer.is_dirty() { " [+]" } else { "" };
        let cursor = self.buffer.cursor();
        format!(
            "{}{} | Ln {}, Col {} | {} lines",
            name,
            dirty,
            cursor.line + 1,
            cursor.col + 1,
            self.buffer.line_count()
        )
    }

    /// Bottom row: prompt, else the last message, else key hints
    pub fn message_line(&self) -> &str {
        if self.quit_prompt {
            QUIT_PROMPT
        } else if let Some(msg) = &self.message {
            msg
        } else {
            KEY_HINTS
        }
    }

    pub fn save(&mut self) -> bool {
        match self.buffer.save() {
            Ok(bytes) => {
                let name = self
                    .buffer
                    .file_name()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                self.message = Some(format!("Wrote {} bytes to {}", bytes, name));
                true
            }
            Err(e) => {
                warn!("Save failed: {}", e);
                self.message = Some(e.to_string());
                false
            }
        }
    }

    fn copy(&mut self) -> bool {
        match self.buffer.selected_text() {
            Some(text) => {
                self.clipboard.set(&text);
                self.message = Some(format!("Copied {} chars", text.chars().count()));
                true
            }
            None => false,
        }
    }

    fn paste(&mut self) {
        if let Some(text) = self.clipboard.get() {
            self.buffer.insert_text(&text);
        }
    }

    fn insert_tab(&mut self) {
        self.buffer.delete_selection();
        for _ in 0..self.options.tab_width.max(1) {
            self.buffer.insert_char(' ');
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.quit_prompt {
            return self.handle_prompt(key);
        }

        let had_message = self.message.take().is_some();
        let before = Snapshot::of(self);

        match key {
            KeyEvent::Control('q') => {
                if !self.buffer.is_dirty() {
                    return Action::Quit;
                }
                self.quit_prompt = true;
            }
            KeyEvent::Control('s') => {
                self.save();
            }
            KeyEvent::Control('a') => self.buffer.select_all(),
            KeyEvent::Control('l') => self.buffer.select_line(),
            KeyEvent::Control('c') => {
                self.copy();
            }
            KeyEvent::Control('x') => {
                if self.copy() {
                    self.buffer.delete_selection();
                }
            }
            KeyEvent::Control('v') => self.paste(),
            KeyEvent::Control('i') => self.insert_tab(),
            KeyEvent::Escape => {
                self.buffer.clear_selection();
            }
            KeyEvent::Arrow(dir) => self.buffer.move_cursor(motion(dir), false),
            KeyEvent::ShiftArrow(dir) => self.buffer.move_cursor(motion(dir), true),
            KeyEvent::Home => self.buffer.move_cursor(Motion::LineStart, false),
            KeyEvent::End => self.buffer.move_cursor(Motion::LineEnd, false),
            KeyEvent::PageUp => self
                .buffer
                .move_cursor(Motion::PageUp(self.text_rows), false),
            KeyEvent::PageDown => self
                .buffer
                .move_cursor(Motion::PageDown(self.text_rows), false),
            KeyEvent::Enter => self.buffer.insert_newline(),
            KeyEvent::Backspace => self.buffer.backspace(),
            KeyEvent::Delete => self.buffer.delete(),
            KeyEvent::Printable(c) => self.buffer.insert_char(c),
            _ => {
                return Action::Continue(if had_message {
                    Damage::STATUS
                } else {
                    Damage::empty()
                });
            }
        }

        self.scroll_to_cursor();
        Action::Continue(before.damage(self))
    }

    fn handle_prompt(&mut self, key: KeyEvent) -> Action {
        match key {
            KeyEvent::Printable('s' | 'S') => {
                if self.save() {
                    info!("Saved on quit");
                    return Action::Quit;
                }
                self.quit_prompt = false;
            }
            KeyEvent::Printable('d' | 'D') => {
                info!("Discarding changes");
                return Action::Quit;
            }
            KeyEvent::Printable('c' | 'C') | KeyEvent::Escape => {
                self.quit_prompt = false;
            }
            _ => return Action::Continue(Damage::empty()),
        }
        Action::Continue(Damage::STATUS)
    }
}

/// What the screen showed before a key, to work out the damage after it
struct Snapshot {
    revision: u64,
    line_count: usize,
    cursor_line: usize,
    scroll: (usize, usize),
    selection: Option<Selection>,
}

impl Snapshot {
    fn of(editor: &Editor) -> Self {
        Self {
            revision: editor.buffer.revision(),
            line_count: editor.buffer.line_count(),
            cursor_line: editor.buffer.cursor().line,
            scroll: (editor.scroll_top, editor.scroll_left),
            selection: editor.buffer.selection(),
        }
    }

    fn damage(&self, editor: &Editor) -> Damage {
        let buffer = &editor.buffer;
        let mut damage = Damage::STATUS;

        if self.line_count != buffer.line_count()
            || self.scroll != (editor.scroll_top, editor.scroll_left)
            || self.selection != buffer.selection()
        {
            damage |= Damage::CONTENT;
        } else if self.revision != buffer.revision() {
            if self.cursor_line == buffer.cursor().line {
                damage |= Damage::LINE;
            } else {
                damage |= Damage::CONTENT;
            }
        }
        damage
    }
}

fn motion(dir: Direction) -> Motion {
    match dir {
        Direction::Up => Motion::Up,
        Direction::Down => Motion::Down,
        Direction::Left => Motion::Left,
        Direction::Right => Motion::Right,
    }
}

fn columns(chars: &[char]) -> usize {
    chars.iter().map(|&c| text::char_width(c)).sum()
}
