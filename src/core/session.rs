//! Terminal session management
//!
//! Owns the raw-mode and alternate-screen lifecycle of the controlling
//! terminal. One `TerminalSession` is created per process and handed to
//! whichever application currently runs; every entry/exit call goes through
//! the internal mutex, so an application started from inside another one
//! never toggles the terminal twice.

use std::sync::{Mutex, MutexGuard};

use crossterm::{
    cursor::{Hide, Show},
    queue,
    style::{Attribute, SetAttribute},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, warn};

use super::backend::{CrosstermBackend, TerminalBackend};
use crate::error::SessionError;

/// Observable terminal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalMode {
    Normal,
    Raw,
    RawAlternate,
}

/// Remembers whether raw mode was already on when `enter_raw` was called
#[must_use = "pass the token to TerminalSession::restore"]
#[derive(Debug)]
pub struct RawToken {
    was_raw: bool,
}

struct Inner {
    backend: Box<dyn TerminalBackend>,
    raw: bool,
    alternate: bool,
    /// Cached (columns, rows), dropped on resize
    size: Option<(u16, u16)>,
}

impl Inner {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.backend.write_all(bytes).map_err(SessionError::Output)
    }
}

/// The process' terminal
pub struct TerminalSession {
    inner: Mutex<Inner>,
}

impl TerminalSession {
    pub fn new(backend: impl TerminalBackend + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                backend: Box::new(backend),
                raw: false,
                alternate: false,
                size: None,
            }),
        }
    }

    /// Session over the real stdin/stdout terminal
    pub fn stdio() -> Self {
        Self::new(CrosstermBackend::new())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock must not prevent restoring the terminal
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mode(&self) -> TerminalMode {
        let inner = self.lock();
        match (inner.raw, inner.alternate) {
            (true, true) => TerminalMode::RawAlternate,
            (true, false) => TerminalMode::Raw,
            (false, _) => TerminalMode::Normal,
        }
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.lock().alternate
    }

    /// Switch to raw input. The token restores exactly the previous mode.
    pub fn enter_raw(&self) -> Result<RawToken, SessionError> {
        let mut inner = self.lock();
        let token = RawToken { was_raw: inner.raw };
        if !inner.raw {
            inner.backend.enable_raw_mode().map_err(SessionError::RawMode)?;
            inner.raw = true;
            debug!("raw mode on");
        }
        Ok(token)
    }

    /// Revert to the mode saved in `token`. Calling it twice is harmless.
    pub fn restore(&self, token: RawToken) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.raw && !token.was_raw {
            inner.backend.disable_raw_mode().map_err(SessionError::RawMode)?;
            inner.raw = false;
            debug!("raw mode off");
        }
        Ok(())
    }

    pub fn enter_alternate_screen(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.alternate {
            return Ok(());
        }
        let mut buf = Vec::new();
        queue!(buf, EnterAlternateScreen).map_err(SessionError::AlternateScreen)?;
        inner.backend.write_all(&buf).map_err(SessionError::AlternateScreen)?;
        inner.alternate = true;
        debug!("alternate screen on");
        Ok(())
    }

    pub fn exit_alternate_screen(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if !inner.alternate {
            return Ok(());
        }
        let mut buf = Vec::new();
        queue!(buf, SetAttribute(Attribute::Reset), LeaveAlternateScreen)
            .map_err(SessionError::AlternateScreen)?;
        inner.backend.write_all(&buf).map_err(SessionError::AlternateScreen)?;
        inner.alternate = false;
        debug!("alternate screen off");
        Ok(())
    }

    /// (columns, rows), cached until the next resize notification
    pub fn size(&self) -> Result<(u16, u16), SessionError> {
        let mut inner = self.lock();
        if let Some(size) = inner.size {
            return Ok(size);
        }
        let size = inner.backend.size().map_err(SessionError::Size)?;
        inner.size = Some(size);
        Ok(size)
    }

    /// True if the terminal was resized since the last call. Drops the cached size.
    pub fn take_resize(&self) -> bool {
        let mut inner = self.lock();
        let resized = inner.backend.take_resize();
        if resized {
            inner.size = None;
        }
        resized
    }

    /// Write one assembled frame
    pub fn present(&self, frame: &[u8]) -> Result<(), SessionError> {
        self.lock().write(frame)
    }

    /// Take over the screen for an application.
    ///
    /// The size is queried first so a terminal that cannot report one fails
    /// before any mode change. The alternate screen is entered before raw mode
    /// and is left again if raw mode cannot be enabled. Any later failure
    /// restores both.
    pub fn acquire(&self) -> Result<ScreenGuard<'_>, SessionError> {
        self.size()?;

        let was_alternate = self.is_alternate_screen();
        self.enter_alternate_screen()?;

        let raw_token = match self.enter_raw() {
            Ok(token) => token,
            Err(e) => {
                if !was_alternate {
                    if let Err(unwind) = self.exit_alternate_screen() {
                        warn!("Failed to leave alternate screen: {}", unwind);
                    }
                }
                return Err(e);
            }
        };

        // From here on an early return drops the guard, which unwinds both modes
        let guard = ScreenGuard {
            session: self,
            was_alternate,
            raw_token: Some(raw_token),
        };

        if !was_alternate {
            let mut buf = Vec::new();
            queue!(buf, Hide).map_err(SessionError::Output)?;
            self.present(&buf)?;
        }

        Ok(guard)
    }
}

/// Scoped ownership of the screen; dropping it restores the terminal
pub struct ScreenGuard<'a> {
    session: &'a TerminalSession,
    was_alternate: bool,
    raw_token: Option<RawToken>,
}

impl ScreenGuard<'_> {
    pub fn session(&self) -> &TerminalSession {
        self.session
    }
}

impl Drop for ScreenGuard<'_> {
    fn drop(&mut self) {
        if !self.was_alternate {
            let mut buf = Vec::new();
            if queue!(buf, Show).is_ok() {
                let _ = self.session.present(&buf);
            }
            if let Err(e) = self.session.exit_alternate_screen() {
                warn!("Failed to leave alternate screen: {}", e);
            }
        }
        if let Some(token) = self.raw_token.take() {
            if let Err(e) = self.session.restore(token) {
                warn!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}
