//! Rendering primitives shared by the pager and the editor.
//!
//! - **renderer**: `Frame` (one buffered ANSI write per update) and `Damage`
//! - **text**: display width, clipping, truncation, word-wrap, match spans

pub mod renderer;
pub mod text;

pub use renderer::{Damage, Frame};
pub use text::Span;
