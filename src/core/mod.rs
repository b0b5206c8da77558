//! Terminal plumbing.
//!
//! - **backend**: device seam (`CrosstermBackend` for the real terminal)
//! - **session**: raw-mode and alternate-screen lifecycle, size cache
//! - **input**: byte stream to `KeyEvent` decoding
//! - **reader**: key source read on a thread, woken on resize
//!
//! # Ownership
//!
//! ```text
//! TerminalSession (one per process)
//! ├── Box<dyn TerminalBackend>
//! └── ScreenGuard (per running application, restores on drop)
//!
//! InputDecoder<R: Read> (one per running application loop)
//! └── WakeableReader (real terminal) + SIGWINCH thread holding a Waker
//! ```

pub mod backend;
pub mod input;
pub mod reader;
pub mod session;

pub use backend::{CrosstermBackend, TerminalBackend};
pub use input::{Direction, InputDecoder, KeyEvent};
pub use reader::{WakeableReader, Waker};
pub use session::{RawToken, ScreenGuard, TerminalMode, TerminalSession};
