//! Single-frame encoding and decoding

use std::io::{self, ErrorKind, Read};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, StoreError};
use crate::note::Note;

use super::wire::NoteFrame;

/// Size of the little-endian length prefix
pub const LEN_PREFIX_SIZE: usize = 4;

/// Encode one note as `[len: u32 LE][payload]`
pub fn encode(note: &Note) -> Result<Bytes> {
    let payload = bincode::serialize(&NoteFrame::from(note)).map_err(StoreError::malformed)?;

    let len = u32::try_from(payload.len()).map_err(|_| {
        StoreError::Malformed(format!(
            "payload of {} bytes exceeds the u32 length prefix",
            payload.len()
        ))
    })?;

    let mut frame = BytesMut::with_capacity(LEN_PREFIX_SIZE + payload.len());
    frame.put_u32_le(len);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Size in bytes of the frame `encode` would produce
pub fn encoded_len(note: &Note) -> Result<usize> {
    let payload = bincode::serialized_size(&NoteFrame::from(note)).map_err(StoreError::malformed)?;
    Ok(LEN_PREFIX_SIZE + payload as usize)
}

/// Decode exactly one frame from `reader`.
///
/// Running out of bytes anywhere, including before the length prefix, is
/// `Truncated`. Use [`decode_all`](super::decode_all) to read a stream that may
/// legitimately end.
pub fn decode<R: Read>(reader: &mut R) -> Result<Note> {
    match read_frame(reader)? {
        Some(note) => Ok(note),
        None => Err(StoreError::Truncated {
            expected: LEN_PREFIX_SIZE,
            actual: 0,
        }),
    }
}

/// Read one frame. `Ok(None)` means the stream ended cleanly on a boundary.
pub(super) fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Note>> {
    let mut prefix = [0u8; LEN_PREFIX_SIZE];
    let got = read_full(reader, &mut prefix)?;
    if got == 0 {
        return Ok(None);
    }
    if got < LEN_PREFIX_SIZE {
        return Err(StoreError::Truncated {
            expected: LEN_PREFIX_SIZE,
            actual: got,
        });
    }

    // `take` keeps a corrupt length from pre-allocating gigabytes.
    let len = u32::from_le_bytes(prefix) as usize;
    let mut payload = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if payload.len() < len {
        return Err(StoreError::Truncated {
            expected: len,
            actual: payload.len(),
        });
    }

    let frame: NoteFrame = bincode::deserialize(&payload).map_err(StoreError::malformed)?;
    Note::try_from(frame).map(Some)
}

/// Like `read_exact`, but reports how many bytes arrived before EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
