//! Frame assembly
//!
//! A `Frame` collects the ANSI output for one screen update into a single
//! buffer so the session can hand it to the terminal in one write. Nothing
//! here remembers the previous frame: callers recompute every visible row
//! from their model and pick how much to clear through `Damage`.

use std::io::{self, Write};

use bitflags::bitflags;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Attribute, SetAttribute},
    terminal::{Clear, ClearType},
};

use super::text::{self, Span};

bitflags! {
    /// What changed since the last frame
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Damage: u8 {
        /// Status line only
        const STATUS  = 0b0001;
        /// The row holding the cursor
        const LINE    = 0b0010;
        /// Every content row, each cleared on its own
        const CONTENT = 0b0100;
        /// Everything: clear the screen first
        const FULL    = 0b1000;
    }
}

/// One frame of output
pub struct Frame {
    buf: Vec<u8>,
    width: u16,
    height: u16,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buf: Vec::with_capacity(width as usize * height as usize + 256),
            width,
            height,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn clear_all(&mut self) -> io::Result<()> {
        queue!(self.buf, Clear(ClearType::All), MoveTo(0, 0))
    }

    /// Zero-based row and column
    pub fn move_to(&mut self, row: u16, col: u16) -> io::Result<()> {
        queue!(self.buf, MoveTo(col, row))
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.buf, Hide)
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        queue!(self.buf, Show)
    }

    pub fn clear_to_eol(&mut self) -> io::Result<()> {
        queue!(self.buf, Clear(ClearType::UntilNewLine))
    }

    pub fn text(&mut self, s: &str) -> io::Result<()> {
        self.buf.write_all(s.as_bytes())
    }

    pub fn reverse(&mut self, s: &str) -> io::Result<()> {
        queue!(self.buf, SetAttribute(Attribute::Reverse))?;
        self.buf.write_all(s.as_bytes())?;
        queue!(self.buf, SetAttribute(Attribute::Reset))
    }

    /// Move to `row`, clear it and draw `s` clipped to the frame width
    pub fn line(&mut self, row: u16, s: &str) -> io::Result<()> {
        self.move_to(row, 0)?;
        self.clear_to_eol()?;
        let clipped = text::clip(s, self.width as usize);
        self.text(clipped)
    }

    /// Like `line`, with the given char spans in reverse video
    pub fn line_with_spans(&mut self, row: u16, s: &str, spans: &[Span]) -> io::Result<()> {
        self.move_to(row, 0)?;
        self.clear_to_eol()?;
        let clipped = text::clip(s, self.width as usize);
        let chars: Vec<char> = clipped.chars().collect();

        let mut pos = 0;
        for span in spans {
            let start = span.start.min(chars.len());
            let end = span.end.min(chars.len());
            if start < pos || start >= end {
                continue;
            }
            self.text(&chars[pos..start].iter().collect::<String>())?;
            self.reverse(&chars[start..end].iter().collect::<String>())?;
            pos = end;
        }
        self.text(&chars[pos..].iter().collect::<String>())
    }

    /// Reverse-video row padded to the full width (status bars)
    pub fn bar(&mut self, row: u16, s: &str) -> io::Result<()> {
        self.move_to(row, 0)?;
        self.clear_to_eol()?;
        let padded = text::pad(s, self.width as usize);
        self.reverse(&padded)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
