//! Note record
//!
//! The entity held by every store. All fields but the identifier are
//! optional so that "not sent" and "cleared" stay distinguishable:
//! `None` is absent, `Some("")` / `Some(false)` is present-but-empty.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier. `Uuid::nil()` means "not assigned yet".
    #[serde(default)]
    pub id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Set once when the note is created, never changed afterwards
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    /// Set on every update, absent until the first one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl Note {
    /// Create an empty note with the given id
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    // =========================================================================
    // Setters (chainable)
    // =========================================================================

    pub fn set_id(&mut self, id: Uuid) -> &mut Self {
        self.id = id;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = Some(content.into());
        self
    }

    pub fn set_created_time(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.created_time = Some(time);
        self
    }

    pub fn set_updated_time(&mut self, time: DateTime<Utc>) -> &mut Self {
        self.updated_time = Some(time);
        self
    }

    pub fn set_is_favorite(&mut self, favorite: bool) -> &mut Self {
        self.is_favorite = Some(favorite);
        self
    }

    // =========================================================================
    // Builders (by value, for literals in callers and tests)
    // =========================================================================

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.set_title(title);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.set_content(content);
        self
    }

    pub fn with_created_time(mut self, time: DateTime<Utc>) -> Self {
        self.set_created_time(time);
        self
    }

    pub fn with_updated_time(mut self, time: DateTime<Utc>) -> Self {
        self.set_updated_time(time);
        self
    }

    pub fn with_is_favorite(mut self, favorite: bool) -> Self {
        self.set_is_favorite(favorite);
        self
    }

    // =========================================================================
    // Getters (absence collapses to the default value)
    // =========================================================================

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite.unwrap_or(false)
    }

    /// Whether the identifier has been assigned
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }

    /// Merge-by-presence update.
    ///
    /// Every field present in `incoming` overwrites the stored value;
    /// absent fields leave it untouched. `id` and `created_time` never change.
    pub fn merge_from(&mut self, incoming: &Note) {
        if let Some(title) = &incoming.title {
            self.title = Some(title.clone());
        }
        if let Some(content) = &incoming.content {
            self.content = Some(content.clone());
        }
        if let Some(updated) = incoming.updated_time {
            self.updated_time = Some(updated);
        }
        if let Some(favorite) = incoming.is_favorite {
            self.is_favorite = Some(favorite);
        }
    }
}

// =============================================================================
// Orderings
// =============================================================================

/// Sort key for listing notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Identifier byte order (the durable file order)
    #[default]
    Id,
    Title,
    CreatedTime,
}

impl SortBy {
    pub fn compare(self, a: &Note, b: &Note) -> Ordering {
        match self {
            SortBy::Id => a.id.as_bytes().cmp(b.id.as_bytes()),
            SortBy::Title => a.title().cmp(b.title()).then_with(|| a.id.cmp(&b.id)),
            SortBy::CreatedTime => a
                .created_time
                .cmp(&b.created_time)
                .then_with(|| a.id.cmp(&b.id)),
        }
    }
}

/// Sort `notes` in place, ascending or descending
pub fn sort_notes(notes: &mut [Note], by: SortBy, ascend: bool) {
    notes.sort_by(|a, b| {
        let ord = by.compare(a, b);
        if ascend {
            ord
        } else {
            ord.reverse()
        }
    });
}
