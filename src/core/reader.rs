//! Wakeable key source
//!
//! A blocking `read` on the terminal does not return when the window is
//! resized, so the real byte source is read on a background thread and
//! handed over through a channel. A `Waker` (fired on SIGWINCH) makes the
//! pending `read` fail with `ErrorKind::Interrupted`, which `InputDecoder`
//! reports as `InputError::Interrupted`.

use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

const CHUNK_SIZE: usize = 1024;

enum Chunk {
    Bytes(Vec<u8>),
    Wake,
    /// End of input, with the error that ended it if any
    End(Option<io::Error>),
}

/// Interrupts one blocked read of its `WakeableReader`
#[derive(Clone)]
pub struct Waker {
    tx: Sender<Chunk>,
}

impl Waker {
    /// False once the reader is gone
    pub fn wake(&self) -> bool {
        self.tx.send(Chunk::Wake).is_ok()
    }
}

/// Byte source fed by a reader thread
///
/// The thread stays blocked on the source after the reader is dropped, until
/// the next byte or end of input arrives.
pub struct WakeableReader {
    rx: Receiver<Chunk>,
    buf: Vec<u8>,
    pos: usize,
    ended: bool,
}

impl WakeableReader {
    pub fn spawn<R: Read + Send + 'static>(mut source: R) -> (Self, Waker) {
        let (tx, rx) = mpsc::channel();
        let feed = tx.clone();

        thread::spawn(move || {
            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                let chunk = match source.read(&mut buf) {
                    Ok(0) => Chunk::End(None),
                    Ok(n) => Chunk::Bytes(buf[..n].to_vec()),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => Chunk::End(Some(e)),
                };
                let end = matches!(chunk, Chunk::End(_));
                if feed.send(chunk).is_err() || end {
                    break;
                }
            }
            debug!("input thread done");
        });

        let reader = Self {
            rx,
            buf: Vec::new(),
            pos: 0,
            ended: false,
        };
        (reader, Waker { tx })
    }

    /// Reader over the terminal's key source, woken on every resize
    pub fn for_terminal<R: Read + Send + 'static>(source: R) -> Self {
        let (reader, waker) = Self::spawn(source);
        wake_on_resize(waker);
        reader
    }
}

#[cfg(unix)]
fn wake_on_resize(waker: Waker) {
    use signal_hook::consts::SIGWINCH;
    use signal_hook::iterator::Signals;
    use tracing::warn;

    let mut signals = match Signals::new([SIGWINCH]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Resize wake-ups unavailable: {}", e);
            return;
        }
    };
    thread::spawn(move || {
        for _ in signals.forever() {
            if !waker.wake() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn wake_on_resize(_waker: Waker) {}

impl Read for WakeableReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.buf.len() {
            if self.ended {
                return Ok(0);
            }
            match self.rx.recv() {
                Ok(Chunk::Bytes(bytes)) => {
                    self.buf = bytes;
                    self.pos = 0;
                }
                Ok(Chunk::Wake) => return Err(io::ErrorKind::Interrupted.into()),
                Ok(Chunk::End(err)) => {
                    self.ended = true;
                    return err.map_or(Ok(0), Err);
                }
                Err(_) => {
                    self.ended = true;
                    return Ok(0);
                }
            }
        }

        let n = (self.buf.len() - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
