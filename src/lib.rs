//! termdeck - a raw-mode terminal pager and line editor
//!
//! The library is split the way the screen is built:
//!
//! - [`core`]: terminal session (raw mode, alternate screen, size) and the
//!   byte-level key decoder
//! - [`ui`]: frame assembly and display-width text helpers
//! - [`pager`]: paging and search over a list of lines
//! - [`editor`]: a single-mode text editor with selection and clipboard
//!
//! Both applications take a [`core::TerminalSession`] and an
//! [`core::InputDecoder`] so they can be embedded in a larger program and
//! driven from any byte source.

pub mod app;
pub mod config;
pub mod core;
pub mod editor;
pub mod error;
pub mod pager;
pub mod ui;

pub use app::ExitReason;
pub use error::{AppError, FileError, InputError, SessionError};
