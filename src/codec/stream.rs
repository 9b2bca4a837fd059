//! Stream-level encoding: many frames to and from one reader/writer

use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, StoreError};
use crate::note::Note;

use super::frame::{encode, read_frame};

/// Lazily decode every frame in `reader`.
///
/// The iterator yields notes until the stream ends on a frame boundary. The
/// first error (truncation, malformed payload, I/O) is yielded once and then
/// the iterator is exhausted. It cannot be restarted.
pub fn decode_all<R: Read>(reader: R) -> FrameIter<R> {
    FrameIter {
        reader,
        finished: false,
    }
}

/// Iterator returned by [`decode_all`]
pub struct FrameIter<R> {
    reader: R,
    finished: bool,
}

impl<R> FrameIter<R> {
    /// Give back the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for FrameIter<R> {
    type Item = Result<Note>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match read_frame(&mut self.reader) {
            Ok(Some(note)) => Some(Ok(note)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for FrameIter<R> {}

/// Encode `notes` to `writer` in iteration order.
///
/// Returns the number of bytes written. A writer that stops accepting bytes
/// mid-frame yields [`StoreError::IncompleteWrite`]; the stream is then in a
/// known-bad state and must be truncated or rewritten by the caller. Does not
/// flush.
pub fn encode_all<'a, W, I>(writer: &mut W, notes: I) -> Result<usize>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a Note>,
{
    let mut total = 0;

    for note in notes {
        let frame = encode(note)?;
        let mut written = 0;

        while written < frame.len() {
            match writer.write(&frame[written..]) {
                Ok(0) => {
                    return Err(StoreError::IncompleteWrite {
                        written: total + written,
                        expected: total + frame.len(),
                    });
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        total += written;
    }

    Ok(total)
}
