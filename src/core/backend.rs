//! Terminal backend
//!
//! The thin layer between the session manager and the real device.
//! `CrosstermBackend` drives the controlling terminal; tests swap in a
//! recording backend.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::terminal;
use tracing::{debug, warn};

/// Operations the session needs from a terminal device
pub trait TerminalBackend: Send {
    /// Switch to unbuffered, unechoed, character-at-a-time input
    fn enable_raw_mode(&mut self) -> io::Result<()>;

    /// Revert the attributes saved by `enable_raw_mode`
    fn disable_raw_mode(&mut self) -> io::Result<()>;

    /// Terminal size as (columns, rows)
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Write and flush in one go
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Returns true once per resize notification received since the last call
    fn take_resize(&mut self) -> bool;
}

/// Backend for the process' controlling terminal
pub struct CrosstermBackend {
    resized: Arc<AtomicBool>,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        let resized = Arc::new(AtomicBool::new(false));

        #[cfg(unix)]
        if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGWINCH, resized.clone()) {
            warn!("Resize notifications unavailable: {}", e);
        }

        Self { resized }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        debug!("enable_raw_mode");
        terminal::enable_raw_mode()
    }

    fn disable_raw_mode(&mut self) -> io::Result<()> {
        debug!("disable_raw_mode");
        terminal::disable_raw_mode()
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(bytes)?;
        out.flush()
    }

    fn take_resize(&mut self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }
}
