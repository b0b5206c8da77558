//! Line editor - a single-mode text editor with selection and clipboard
//!
//! # Screen layout
//!
//! ```text
//! rows 0..h-2   text, with an optional line-number gutter
//! row  h-2      status bar (file, dirty marker, cursor position)
//! row  h-1      message / quit prompt / key hints
//! ```
//!
//! Every key acts immediately; there are no insert or command modes.

pub mod buffer;
pub mod clipboard;
mod state;

pub use buffer::{EditorBuffer, Motion, Position, Selection};
pub use clipboard::Clipboard;
pub use state::{Action, Editor, EditorOptions};

use std::io::{self, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::app::{self, ExitReason};
use crate::core::{InputDecoder, TerminalSession};
use crate::error::{InputError, Result};
use crate::ui::{text, Damage, Frame};

/// Edit `path` until the user quits or input ends.
///
/// A file that cannot be read leaves the editor running on an empty buffer
/// bound to the same path, with the error shown on the message row.
pub fn run<R: Read>(
    session: &TerminalSession,
    input: &mut InputDecoder<R>,
    path: Option<&Path>,
    options: EditorOptions,
    clipboard: Clipboard,
) -> Result<ExitReason> {
    let (buffer, error) = match path {
        Some(path) => match EditorBuffer::open(path) {
            Ok(buffer) => (buffer, None),
            Err(e) => {
                warn!("editor: {}", e);
                let mut buffer = EditorBuffer::new();
                buffer.set_file_name(path.to_path_buf());
                (buffer, Some(e.to_string()))
            }
        },
        None => (EditorBuffer::new(), None),
    };

    let _screen = session.acquire()?;
    let (width, height) = session.size()?;

    info!("editor: {} lines", buffer.line_count());
    let mut editor = Editor::new(buffer, clipboard, options);
    editor.resize(width, app::content_rows(height));
    if let Some(msg) = error {
        editor.set_message(msg);
    }

    let mut damage = Damage::FULL;
    loop {
        if session.take_resize() {
            let (width, height) = session.size()?;
            editor.resize(width, app::content_rows(height));
            damage |= Damage::FULL;
        }

        if !damage.is_empty() {
            let (width, height) = session.size()?;
            let frame = render(&editor, width, height, damage)?;
            session.present(&frame.into_bytes())?;
        }

        let key = match input.read_key() {
            Ok(key) => key,
            // Woken without a key, most likely by a resize
            Err(InputError::Interrupted) => {
                damage = Damage::empty();
                continue;
            }
            Err(e) => return Ok(app::input_closed("editor", e)),
        };

        match editor.handle_key(key) {
            Action::Quit => break,
            Action::Continue(d) => damage = d,
        }
    }

    info!("editor: quit");
    Ok(ExitReason::Quit)
}

/// Build the frame for `editor`
pub fn render(editor: &Editor, width: u16, height: u16, damage: Damage) -> io::Result<Frame> {
    let height = height.max(3);
    let mut frame = Frame::new(width, height);
    frame.hide_cursor()?;

    let rows = editor.text_rows().min(height as usize - 2);
    if damage.contains(Damage::FULL) {
        frame.clear_all()?;
    }
    if damage.intersects(Damage::FULL | Damage::CONTENT) {
        for row in 0..rows {
            draw_row(&mut frame, editor, row)?;
        }
    } else if damage.contains(Damage::LINE) {
        let (row, _) = editor.cursor_cell();
        if row < rows {
            draw_row(&mut frame, editor, row)?;
        }
    }

    frame.bar(height - 2, &editor.status_line())?;
    frame.line(height - 1, editor.message_line())?;

    let (row, col) = editor.cursor_cell();
    frame.move_to(row as u16, col.min(width.saturating_sub(1) as usize) as u16)?;
    frame.show_cursor()?;
    Ok(frame)
}

fn draw_row(frame: &mut Frame, editor: &Editor, row: usize) -> io::Result<()> {
    frame.move_to(row as u16, 0)?;
    frame.clear_to_eol()?;

    let buffer = editor.buffer();
    let idx = editor.scroll_top() + row;
    let Some(line) = buffer.lines().get(idx) else {
        return frame.text("~");
    };

    let gutter = editor.gutter_width();
    if gutter > 0 {
        frame.text(&format!("{:>w$} ", idx + 1, w = gutter - 1))?;
    }

    // Visible slice of the line and its selected part, in char indices
    let cols = editor.text_cols();
    let start = editor.scroll_left().min(line.len());
    let mut end = start;
    let mut used = 0;
    while end < line.len() && used + text::char_width(line[end]) <= cols {
        used += text::char_width(line[end]);
        end += 1;
    }
    let visible = &line[start..end];

    let selected = buffer
        .selection()
        .and_then(|sel| sel.columns_on(idx, line.len()).map(|cols| (sel, cols)));
    let Some((sel, (from, to))) = selected else {
        return frame.text(&render_chars(visible));
    };

    let from = from.clamp(start, end) - start;
    let to = to.clamp(start, end) - start;
    frame.text(&render_chars(&visible[..from]))?;
    frame.reverse(&render_chars(&visible[from..to]))?;
    frame.text(&render_chars(&visible[to..]))?;

    // Selection runs on past the end of this line
    if idx < sel.end.line && end == line.len() && used < cols {
        frame.reverse(" ")?;
    }
    Ok(())
}

fn render_chars(chars: &[char]) -> String {
    chars.iter().map(|&c| text::display_char(c)).collect()
}
