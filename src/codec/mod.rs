//! Record Codec
//!
//! Self-delimiting binary encoding of notes, so any number of them can be
//! written to one stream and read back without outside framing.
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬───────────────────────────────────────────┐
//! │ Len (4, LE)  │ Payload (Len bytes, bincode NoteFrame)    │
//! └──────────────┴───────────────────────────────────────────┘
//! ```
//!
//! ## Payload (bincode v1, field order fixed)
//! - id:           bytes, exactly 16
//! - title:        option<string>
//! - content:      option<string>
//! - created_time: option<(i64 seconds, u32 nanos)>
//! - updated_time: option<(i64 seconds, u32 nanos)>
//! - is_favorite:  option<bool>
//!
//! ## Stream Format
//! Zero or more frames back to back. No header, footer or version.
//! End of stream exactly on a frame boundary is a clean end; anywhere else it
//! is [`StoreError::Truncated`](crate::StoreError::Truncated).

mod frame;
mod stream;
mod wire;

pub use frame::{decode, encode, encoded_len, LEN_PREFIX_SIZE};
pub use stream::{decode_all, encode_all, FrameIter};
