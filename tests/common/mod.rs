//! Shared test helpers
#![allow(dead_code)]

#[macro_use]
pub mod conformance;

use chrono::{DateTime, Utc};
use notestore::Note;
use uuid::Uuid;

/// A fully populated note with a fresh id
pub fn sample_note() -> Note {
    Note::new(Uuid::new_v4())
        .with_title("First Test")
        .with_content("Lorem Ipsum")
        .with_created_time(Utc::now())
        .with_is_favorite(false)
}

/// A fully populated note with `title` and a fresh id
pub fn titled_note(title: &str) -> Note {
    sample_note().with_title(title)
}

/// A fixed timestamp, for assertions that must not depend on the clock
pub fn fixed_time(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 123_456_789).unwrap()
}
