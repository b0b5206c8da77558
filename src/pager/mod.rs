//! Pager - pages through an immutable list of lines with search
//!
//! # Screen layout
//!
//! ```text
//! rows 0..h-2   page content (one item per row, or wrapped rows)
//! row  h-2      blank
//! row  h-1      status line (query / help / position)
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | q | Quit |
//! | / | Search (Enter runs, Esc cancels) |
//! | n/N | Next/previous match |
//! | c | Clear search |
//! | w | Toggle wrap |
//! | h | Toggle help |
//! | PgUp/PgDn, arrows, Space, b | Page |
//! | Home/End, g/G | First/last page |

mod state;

pub use state::{Action, Mode, PagerState};

use std::io::{self, Read};

use tracing::info;

use crate::app::{self, ExitReason};
use crate::core::{InputDecoder, TerminalSession};
use crate::error::{InputError, Result};
use crate::ui::{text, Damage, Frame};

/// Startup options
#[derive(Debug, Clone, Default)]
pub struct PagerOptions {
    /// Start with word-wrap on
    pub wrap: bool,
}

/// Run the pager until the user quits or input ends.
///
/// The terminal is restored on every return path, including errors.
pub fn run<R: Read>(
    session: &TerminalSession,
    input: &mut InputDecoder<R>,
    items: Vec<String>,
    options: &PagerOptions,
) -> Result<ExitReason> {
    let _screen = session.acquire()?;
    let (width, height) = session.size()?;

    info!("pager: {} lines", items.len());
    let mut state = PagerState::new(items, app::content_rows(height));
    state.resize(width as usize, app::content_rows(height));
    state.set_wrap_text(options.wrap);

    let mut damage = Damage::FULL;
    loop {
        if session.take_resize() {
            let (width, height) = session.size()?;
            state.resize(width as usize, app::content_rows(height));
            damage |= Damage::FULL;
        }

        if !damage.is_empty() {
            let (width, height) = session.size()?;
            let frame = render(&state, width, height, damage)?;
            session.present(&frame.into_bytes())?;
        }

        let key = match input.read_key() {
            Ok(key) => key,
            // Woken without a key, most likely by a resize
            Err(InputError::Interrupted) => {
                damage = Damage::empty();
                continue;
            }
            Err(e) => return Ok(app::input_closed("pager", e)),
        };

        match state.handle_key(key) {
            Action::Quit => break,
            Action::Continue(d) => damage = d,
        }
    }

    info!("pager: quit");
    Ok(ExitReason::Quit)
}

/// Build the frame for `state`
pub fn render(state: &PagerState, width: u16, height: u16, damage: Damage) -> io::Result<Frame> {
    let height = height.max(1);
    let mut frame = Frame::new(width, height);
    frame.hide_cursor()?;

    if damage.contains(Damage::FULL) {
        frame.clear_all()?;
        let rows = state.page_size().min(height as usize - 1);
        draw_page(&mut frame, state, rows)?;
    }
    if damage.intersects(Damage::FULL | Damage::STATUS) {
        frame.bar(height - 1, &state.status_line())?;
    }
    Ok(frame)
}

fn draw_page(frame: &mut Frame, state: &PagerState, rows: usize) -> io::Result<()> {
    let width = frame.width() as usize;
    let current = state.current_match_item();

    // (row text, belongs to the current match)
    let mut screen: Vec<(String, bool)> = Vec::with_capacity(rows);
    for idx in state.page_range() {
        let item = text::sanitize(&state.items()[idx]);
        let is_current = current == Some(idx);
        if state.wrap_text() {
            screen.extend(text::wrap(&item, width).into_iter().map(|r| (r, is_current)));
        } else {
            screen.push((text::truncate(&item, width), is_current));
        }
    }

    if screen.len() > rows {
        screen.truncate(rows);
        if let Some((last, _)) = screen.last_mut() {
            let mut clipped = text::clip(last, width.saturating_sub(1)).to_string();
            clipped.push('…');
            *last = clipped;
        }
    }

    for (row, (line, is_current)) in screen.iter().enumerate() {
        let row = row as u16;
        if *is_current {
            frame.bar(row, line)?;
        } else {
            let spans = state
                .highlight_query()
                .map(|q| text::match_spans(line, q))
                .unwrap_or_default();
            frame.line_with_spans(row, line, &spans)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::mock::{MockBackend, ResizeThenKeys};
    use crate::core::TerminalMode;
    use crate::core::KeyEvent;
    use std::io::Cursor;

    fn fruits() -> Vec<String> {
        vec!["apple".into(), "banana".into(), "cherry".into()]
    }

    fn rendered(state: &PagerState, width: u16, height: u16, damage: Damage) -> String {
        String::from_utf8(render(state, width, height, damage).unwrap().into_bytes()).unwrap()
    }

    #[test]
    fn test_full_render_clears_and_draws_page() {
        let state = PagerState::new(fruits(), 2);
        let out = rendered(&state, 40, 4, Damage::FULL);

        assert!(out.contains("\x1b[2J"));
        assert!(out.contains("apple"));
        assert!(out.contains("banana"));
        assert!(!out.contains("cherry"));
        assert!(out.contains("page 1/2"));
    }

    #[test]
    fn test_status_render_touches_only_status_row() {
        let state = PagerState::new(fruits(), 2);
        let out = rendered(&state, 40, 4, Damage::STATUS);

        assert!(!out.contains("\x1b[2J"));
        assert!(!out.contains("apple"));
        assert!(out.contains("\x1b[4;1H\x1b[K"));
    }

    #[test]
    fn test_matches_are_highlighted() {
        let mut state = PagerState::new(
            vec!["banana".into(), "mango".into(), "kiwi".into()],
            3,
        );
        state.handle_key(KeyEvent::Printable('/'));
        state.handle_key(KeyEvent::Printable('n'));
        state.handle_key(KeyEvent::Printable('g'));
        state.handle_key(KeyEvent::Enter);
        assert_eq!(state.search_matches(), [1]);

        let mut state2 = PagerState::new(vec!["banana".into(), "mango".into()], 3);
        for key in [KeyEvent::Printable('/'), KeyEvent::Printable('a'), KeyEvent::Enter] {
            state2.handle_key(key);
        }
        let out = rendered(&state2, 20, 5, Damage::FULL);
        // Current match (banana) is drawn as a full reverse bar
        assert!(out.contains("\x1b[7mbanana"));
        // Other matching lines get reverse spans
        assert!(out.contains("m\x1b[7ma\x1b[0mngo"));
    }

    #[test]
    fn test_truncation_and_wrap() {
        let mut state = PagerState::new(vec!["alpha beta gamma delta".into()], 3);
        let out = rendered(&state, 10, 5, Damage::FULL);
        assert!(out.contains("alpha bet…"));

        state.toggle_wrap();
        let out = rendered(&state, 10, 5, Damage::FULL);
        assert!(out.contains("alpha beta"));
        assert!(out.contains("gamma"));
        assert!(out.contains("delta"));
    }

    #[test]
    fn test_run_quits_and_restores() {
        let (backend, rec) = MockBackend::new(40, 4);
        let session = TerminalSession::new(backend);
        let mut input = InputDecoder::new(Cursor::new(b"\x1b[6~q".to_vec()));

        let reason = run(&session, &mut input, fruits(), &PagerOptions::default()).unwrap();

        assert_eq!(reason, ExitReason::Quit);
        assert_eq!(session.mode(), TerminalMode::Normal);
        assert!(!rec.is_raw());
        let out = rec.output();
        assert!(out.contains("apple"));
        assert!(out.contains("cherry"));
        assert!(out.contains("page 2/2"));
        assert!(out.ends_with("\x1b[?25h\x1b[0m\x1b[?1049l"));
    }

    #[test]
    fn test_run_input_eof_is_implicit_quit() {
        let (backend, rec) = MockBackend::new(40, 4);
        let session = TerminalSession::new(backend);
        let mut input = InputDecoder::new(Cursor::new(Vec::new()));

        let reason = run(&session, &mut input, fruits(), &PagerOptions::default()).unwrap();

        assert_eq!(reason, ExitReason::InputClosed);
        assert_eq!(session.mode(), TerminalMode::Normal);
        assert!(!rec.is_raw());
    }

    #[test]
    fn test_run_startup_failure_leaves_terminal_alone() {
        let (mut backend, rec) = MockBackend::new(40, 4);
        backend.fail_raw = true;
        let session = TerminalSession::new(backend);
        let mut input = InputDecoder::new(Cursor::new(b"q".to_vec()));

        assert!(run(&session, &mut input, fruits(), &PagerOptions::default()).is_err());
        assert_eq!(session.mode(), TerminalMode::Normal);
        assert!(!session.is_alternate_screen());
        assert!(!rec.is_raw());
    }

    #[test]
    fn test_wrap_walk_renders_every_item() {
        let items: Vec<String> = (0..8).map(|i| format!("item{} bbbb cccc dddd", i)).collect();
        let mut state = PagerState::new(items, app::content_rows(6));
        state.resize(10, app::content_rows(6));
        state.set_wrap_text(true);

        let mut out = rendered(&state, 10, 6, Damage::FULL);
        while state.next_page() {
            out.push_str(&rendered(&state, 10, 6, Damage::FULL));
        }
        for i in 0..8 {
            assert!(out.contains(&format!("item{}", i)), "item{} never shown", i);
        }
        assert!(!out.contains('…'));
    }

    #[test]
    fn test_run_redraws_on_resize_before_next_key() {
        let (backend, rec) = MockBackend::new(40, 4);
        let session = TerminalSession::new(backend);
        let mut input = InputDecoder::new(ResizeThenKeys::new(&rec, (40, 3), b"q"));

        let reason = run(&session, &mut input, fruits(), &PagerOptions::default()).unwrap();

        assert_eq!(reason, ExitReason::Quit);
        let out = rec.output();
        assert!(out.contains("page 1/2"));
        // Only the redraw triggered by the resize can show three pages
        assert!(out.contains("page 1/3"));
        assert_eq!(out.matches("\x1b[2J").count(), 2);
    }

    #[test]
    fn test_run_resize_recomputes_pages() {
        let (backend, rec) = MockBackend::new(40, 4);
        rec.resize(40, 3);
        let session = TerminalSession::new(backend);
        let mut input = InputDecoder::new(Cursor::new(b"q".to_vec()));

        run(&session, &mut input, fruits(), &PagerOptions::default()).unwrap();
        assert!(rec.output().contains("page 1/3"));
    }
}
