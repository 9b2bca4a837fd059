//! Wire representation of a note
//!
//! Kept separate from [`Note`] so the on-disk layout does not move when the
//! domain type gains derives or serde attributes for JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::note::Note;

/// Payload of one frame
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct NoteFrame {
    pub id: Vec<u8>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub created_time: Option<WireTime>,
    pub updated_time: Option<WireTime>,
    pub is_favorite: Option<bool>,
}

/// Seconds + nanoseconds since the unix epoch, lossless for `DateTime<Utc>`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub(super) struct WireTime {
    pub seconds: i64,
    pub nanos: u32,
}

impl From<DateTime<Utc>> for WireTime {
    fn from(time: DateTime<Utc>) -> Self {
        Self {
            seconds: time.timestamp(),
            nanos: time.timestamp_subsec_nanos(),
        }
    }
}

impl WireTime {
    fn into_datetime(self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos).ok_or_else(|| {
            StoreError::Malformed(format!(
                "timestamp out of range: {}s {}ns",
                self.seconds, self.nanos
            ))
        })
    }
}

impl From<&Note> for NoteFrame {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.as_bytes().to_vec(),
            title: note.title.clone(),
            content: note.content.clone(),
            created_time: note.created_time.map(WireTime::from),
            updated_time: note.updated_time.map(WireTime::from),
            is_favorite: note.is_favorite,
        }
    }
}

impl TryFrom<NoteFrame> for Note {
    type Error = StoreError;

    fn try_from(frame: NoteFrame) -> Result<Self> {
        let id = Uuid::from_slice(&frame.id).map_err(StoreError::malformed)?;

        Ok(Note {
            id,
            title: frame.title,
            content: frame.content,
            created_time: frame.created_time.map(WireTime::into_datetime).transpose()?,
            updated_time: frame.updated_time.map(WireTime::into_datetime).transpose()?,
            is_favorite: frame.is_favorite,
        })
    }
}
