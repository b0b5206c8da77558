//! Key decoding
//!
//! Turns the raw byte stream of a terminal in raw mode into logical key
//! events. Escape sequences are resolved against a fixed table by longest
//! prefix. Lookahead after ESC is limited to what the terminal delivered in
//! the same read plus, when those bytes are the start of a known sequence,
//! further reads up to the longest table entry.

use std::collections::VecDeque;
use std::io::{self, Read};

use crate::error::InputError;

/// Arrow direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// A logical key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Printable(char),
    Enter,
    Backspace,
    Delete,
    Arrow(Direction),
    Home,
    End,
    PageUp,
    PageDown,
    /// Ctrl + lowercase letter (Tab arrives as `Control('i')`)
    Control(char),
    ShiftArrow(Direction),
    Escape,
    Unknown,
}

use Direction::*;
use KeyEvent::*;

/// Sequences following ESC. No entry is a prefix of another.
const SEQUENCES: &[(&[u8], KeyEvent)] = &[
    // CSI arrows
    (b"[A", Arrow(Up)),
    (b"[B", Arrow(Down)),
    (b"[C", Arrow(Right)),
    (b"[D", Arrow(Left)),
    // SS3 arrows (application cursor mode)
    (b"OA", Arrow(Up)),
    (b"OB", Arrow(Down)),
    (b"OC", Arrow(Right)),
    (b"OD", Arrow(Left)),
    // Home / End
    (b"[H", Home),
    (b"OH", Home),
    (b"[1~", Home),
    (b"[7~", Home),
    (b"[F", End),
    (b"OF", End),
    (b"[4~", End),
    (b"[8~", End),
    // Editing block
    (b"[3~", Delete),
    (b"[5~", PageUp),
    (b"[6~", PageDown),
    // Shift + arrows
    (b"[1;2A", ShiftArrow(Up)),
    (b"[1;2B", ShiftArrow(Down)),
    (b"[1;2C", ShiftArrow(Right)),
    (b"[1;2D", ShiftArrow(Left)),
];

/// Longest table entry
const MAX_LOOKAHEAD: usize = 5;

const CHUNK_SIZE: usize = 1024;

/// Blocking key reader over a byte source
pub struct InputDecoder<R> {
    source: R,
    pending: VecDeque<u8>,
}

impl<R: Read> InputDecoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            pending: VecDeque::with_capacity(CHUNK_SIZE),
        }
    }

    /// Block until one logical key is available.
    ///
    /// A source read interrupted before any byte of the key arrived returns
    /// `InputError::Interrupted`, so the caller can handle a resize and call
    /// again. Interruptions in the middle of a key are retried.
    pub fn read_key(&mut self) -> Result<KeyEvent, InputError> {
        loop {
            if self.pending.is_empty() && self.read_source()? == 0 {
                return Err(InputError::Closed);
            }
            let byte = self.next_byte()?;
            if let Some(key) = self.decode(byte)? {
                return Ok(key);
            }
        }
    }

    fn decode(&mut self, byte: u8) -> Result<Option<KeyEvent>, InputError> {
        let key = match byte {
            0x1B => self.decode_escape()?,
            b'\r' => {
                // CR LF from pasted text counts once
                if self.pending.front() == Some(&b'\n') {
                    self.pending.pop_front();
                }
                Enter
            }
            b'\n' => Enter,
            0x7F | 0x08 => Backspace,
            0x09 => Control('i'),
            0x01..=0x1A => Control((b'a' + byte - 1) as char),
            0x00..=0x1F => return Ok(None),
            0x20..=0x7E => Printable(byte as char),
            _ => self.decode_utf8(byte)?,
        };
        Ok(Some(key))
    }

    fn decode_escape(&mut self) -> Result<KeyEvent, InputError> {
        // Nothing else arrived with the ESC: the user pressed Escape
        if self.pending.is_empty() {
            return Ok(Escape);
        }

        loop {
            let lookahead: Vec<u8> = self.pending.iter().take(MAX_LOOKAHEAD).copied().collect();

            let matched = SEQUENCES
                .iter()
                .filter(|(seq, _)| lookahead.starts_with(seq))
                .max_by_key(|(seq, _)| seq.len());
            if let Some((seq, key)) = matched {
                self.pending.drain(..seq.len());
                return Ok(*key);
            }

            let incomplete = lookahead.len() < MAX_LOOKAHEAD
                && SEQUENCES
                    .iter()
                    .any(|(seq, _)| seq.len() > lookahead.len() && seq.starts_with(&lookahead));
            if !incomplete || self.fill()? == 0 {
                break;
            }
        }

        self.skip_unknown_sequence();
        Ok(Escape)
    }

    /// Drop an unrecognised CSI/SS3 sequence from the pending bytes
    fn skip_unknown_sequence(&mut self) {
        match self.pending.front() {
            Some(b'[') => {
                self.pending.pop_front();
                while let Some(&b) = self.pending.front() {
                    self.pending.pop_front();
                    if (0x40..=0x7E).contains(&b) {
                        break;
                    }
                    if !(0x20..=0x3F).contains(&b) {
                        // Not part of a CSI sequence after all
                        self.pending.push_front(b);
                        break;
                    }
                }
            }
            Some(b'O') => {
                self.pending.pop_front();
                self.pending.pop_front();
            }
            _ => {}
        }
    }

    fn decode_utf8(&mut self, lead: u8) -> Result<KeyEvent, InputError> {
        let width = match lead {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Ok(Unknown),
        };

        let mut bytes = [lead, 0, 0, 0];
        for slot in bytes.iter_mut().take(width).skip(1) {
            let b = self.next_byte()?;
            if b & 0xC0 != 0x80 {
                self.pending.push_front(b);
                return Ok(Unknown);
            }
            *slot = b;
        }

        Ok(std::str::from_utf8(&bytes[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Printable)
            .unwrap_or(Unknown))
    }

    fn next_byte(&mut self) -> Result<u8, InputError> {
        loop {
            if let Some(b) = self.pending.pop_front() {
                return Ok(b);
            }
            if self.fill()? == 0 {
                return Err(InputError::Closed);
            }
        }
    }

    /// One read from the source, retried when interrupted. Zero means end of input.
    fn fill(&mut self) -> Result<usize, InputError> {
        loop {
            match self.read_source() {
                Err(InputError::Interrupted) => continue,
                result => return result,
            }
        }
    }

    fn read_source(&mut self) -> Result<usize, InputError> {
        let mut buf = [0u8; CHUNK_SIZE];
        match self.source.read(&mut buf) {
            Ok(n) => {
                self.pending.extend(&buf[..n]);
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(InputError::Interrupted),
            Err(e) => Err(InputError::Read(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Delivers each chunk in its own read, like a terminal would
    struct Chunked(VecDeque<Vec<u8>>);

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Ok(0),
            }
        }
    }

    fn decode_all(bytes: &[u8]) -> Vec<KeyEvent> {
        let mut decoder = InputDecoder::new(Cursor::new(bytes.to_vec()));
        let mut keys = Vec::new();
        while let Ok(key) = decoder.read_key() {
            keys.push(key);
        }
        keys
    }

    fn decode_chunks(chunks: &[&[u8]]) -> Vec<KeyEvent> {
        let source = Chunked(chunks.iter().map(|c| c.to_vec()).collect());
        let mut decoder = InputDecoder::new(source);
        let mut keys = Vec::new();
        while let Ok(key) = decoder.read_key() {
            keys.push(key);
        }
        keys
    }

    #[test]
    fn test_printable_and_controls() {
        assert_eq!(
            decode_all(b"a Z~\r\x7f\x08\x11\x13\x0c"),
            vec![
                Printable('a'),
                Printable(' '),
                Printable('Z'),
                Printable('~'),
                Enter,
                Backspace,
                Backspace,
                Control('q'),
                Control('s'),
                Control('l'),
            ]
        );
    }

    #[test]
    fn test_crlf_is_one_enter() {
        assert_eq!(decode_all(b"a\r\nb\n"), vec![Printable('a'), Enter, Printable('b'), Enter]);
    }

    #[test]
    fn test_unbound_control_codes_are_skipped() {
        assert_eq!(decode_all(b"\x00\x1c\x1fx"), vec![Printable('x')]);
    }

    #[test]
    fn test_arrow_keys() {
        assert_eq!(
            decode_all(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1bOA\x1bOD"),
            vec![
                Arrow(Up),
                Arrow(Down),
                Arrow(Right),
                Arrow(Left),
                Arrow(Up),
                Arrow(Left),
            ]
        );
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(
            decode_all(b"\x1b[H\x1b[1~\x1b[7~\x1bOH\x1b[F\x1b[4~\x1b[8~\x1b[5~\x1b[6~\x1b[3~"),
            vec![Home, Home, Home, Home, End, End, End, PageUp, PageDown, Delete]
        );
    }

    #[test]
    fn test_shift_arrows() {
        assert_eq!(
            decode_all(b"\x1b[1;2C\x1b[1;2D\x1b[1;2A\x1b[1;2B"),
            vec![
                ShiftArrow(Right),
                ShiftArrow(Left),
                ShiftArrow(Up),
                ShiftArrow(Down),
            ]
        );
    }

    #[test]
    fn test_lone_escape() {
        assert_eq!(decode_chunks(&[b"\x1b", b"q"]), vec![Escape, Printable('q')]);
        assert_eq!(decode_all(b"\x1b"), vec![Escape]);
    }

    #[test]
    fn test_escape_followed_by_plain_byte() {
        assert_eq!(decode_all(b"\x1bx"), vec![Escape, Printable('x')]);
    }

    #[test]
    fn test_unknown_sequence_degrades_to_escape() {
        // Ctrl+Up and F5 are not in the table
        assert_eq!(decode_all(b"\x1b[1;5Aa"), vec![Escape, Printable('a')]);
        assert_eq!(decode_all(b"\x1b[15~b"), vec![Escape, Printable('b')]);
        assert_eq!(decode_all(b"\x1bOPc"), vec![Escape, Printable('c')]);
    }

    #[test]
    fn test_sequence_split_across_reads() {
        assert_eq!(decode_chunks(&[b"\x1b[", b"A"]), vec![Arrow(Up)]);
        assert_eq!(decode_chunks(&[b"\x1b[1;", b"2C"]), vec![ShiftArrow(Right)]);
    }

    #[test]
    fn test_truncated_sequence_at_eof() {
        assert_eq!(decode_all(b"\x1b[1;2"), vec![Escape]);
    }

    #[test]
    fn test_utf8_runes() {
        assert_eq!(
            decode_all("é日🦀".as_bytes()),
            vec![Printable('é'), Printable('日'), Printable('🦀')]
        );
        assert_eq!(decode_chunks(&[&[0xE6, 0x97], &[0xA5]]), vec![Printable('日')]);
    }

    #[test]
    fn test_invalid_utf8_is_unknown() {
        assert_eq!(decode_all(&[0xFF, b'a']), vec![Unknown, Printable('a')]);
        assert_eq!(decode_all(&[0xC3, b'a']), vec![Unknown, Printable('a')]);
    }

    #[test]
    fn test_eof_is_closed() {
        let mut decoder = InputDecoder::new(Cursor::new(Vec::new()));
        assert!(matches!(decoder.read_key(), Err(InputError::Closed)));
    }

    /// Scripted reads where `None` is an interrupted read
    struct Interrupting(VecDeque<Option<&'static [u8]>>);

    impl Read for Interrupting {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Some(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(chunk);
                    Ok(chunk.len())
                }
                Some(None) => Err(io::Error::from(io::ErrorKind::Interrupted)),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_interrupt_between_keys_is_reported() {
        let source = Interrupting(VecDeque::from([Some(&b"a"[..]), None, Some(&b"b"[..])]));
        let mut decoder = InputDecoder::new(source);

        assert_eq!(decoder.read_key().unwrap(), Printable('a'));
        assert!(matches!(decoder.read_key(), Err(InputError::Interrupted)));
        assert_eq!(decoder.read_key().unwrap(), Printable('b'));
        assert!(matches!(decoder.read_key(), Err(InputError::Closed)));
    }

    #[test]
    fn test_interrupt_inside_key_is_retried() {
        let source = Interrupting(VecDeque::from([
            Some(&b"\x1b["[..]),
            None,
            Some(&b"A"[..]),
            Some(&[0xE6][..]),
            None,
            Some(&[0x97, 0xA5][..]),
        ]));
        let mut decoder = InputDecoder::new(source);

        assert_eq!(decoder.read_key().unwrap(), Arrow(Up));
        assert_eq!(decoder.read_key().unwrap(), Printable('日'));
    }

    #[test]
    fn test_read_error_is_reported() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
        }
        let mut decoder = InputDecoder::new(Broken);
        assert!(matches!(decoder.read_key(), Err(InputError::Read(_))));
    }
}
