//! Error taxonomy shared by the session, the decoder and both applications.
//!
//! - **SessionError**: terminal mode or size failures. Fatal to startup.
//! - **InputError**: the key source failed mid-session. Treated as a quit,
//!   except `Interrupted`, which only wakes the loop.
//! - **FileError**: editor open/save failures. Shown in the status line.
//! - **AppError**: what the application entry points hand back to callers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to switch raw mode: {0}")]
    RawMode(#[source] io::Error),

    #[error("Failed to switch alternate screen: {0}")]
    AlternateScreen(#[source] io::Error),

    #[error("Failed to query terminal size: {0}")]
    Size(#[source] io::Error),

    #[error("Failed to write to terminal: {0}")]
    Output(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Input closed")]
    Closed,

    /// The read was woken before a key arrived; call again
    #[error("Input interrupted")]
    Interrupted,

    #[error("Failed to read input: {0}")]
    Read(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No file name")]
    NoPath,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Failed to render: {0}")]
    Render(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
