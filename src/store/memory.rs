//! Volatile store
//!
//! The index with no persistence. For tests and for deployments that accept
//! losing every note on restart.

use uuid::Uuid;

use crate::context::Context;
use crate::error::{Result, StoreError};
use crate::index::NoteIndex;
use crate::note::Note;

use super::Store;

/// In-memory implementation of [`Store`]. Safe for concurrent use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    index: NoteIndex,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing notes
    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        Self {
            index: NoteIndex::from_notes(notes),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Copies of every note, in identifier order
    pub fn notes(&self) -> Vec<Note> {
        self.index.snapshot()
    }
}

impl Store for MemoryStore {
    fn insert(&self, ctx: &Context, note: &Note) -> Result<()> {
        ctx.check()?;
        if !note.has_id() {
            return Err(StoreError::EmptyIdentifier);
        }

        let mut notes = self.index.write_within(ctx)?;
        let _ = notes.insert(note)?;

        tracing::trace!(id = %note.id, "inserted note");
        Ok(())
    }

    fn update(&self, ctx: &Context, note: &Note) -> Result<Note> {
        ctx.check()?;
        if !note.has_id() {
            return Err(StoreError::EmptyIdentifier);
        }

        let mut notes = self.index.write_within(ctx)?;
        let (merged, _) = notes.update(note)?;

        tracing::trace!(id = %note.id, "updated note");
        Ok(merged)
    }

    fn delete(&self, ctx: &Context, id: Uuid) -> Result<()> {
        ctx.check()?;

        let mut notes = self.index.write_within(ctx)?;
        let _ = notes.delete(&id);

        tracing::trace!(%id, "deleted note");
        Ok(())
    }

    fn get(&self, ctx: &Context, id: Uuid) -> Result<Note> {
        ctx.check()?;

        let notes = self.index.read_within(ctx)?;
        notes.get(&id)
    }
}
