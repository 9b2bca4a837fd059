//! Note service
//!
//! Business rules that sit above a [`Store`]: identifier assignment,
//! creation/update timestamps and existence checks. This is the only caller
//! of the store in the application.

use chrono::Utc;
use uuid::Uuid;

use crate::context::Context;
use crate::error::{Result, StoreError};
use crate::note::Note;
use crate::store::Store;

/// Note business logic over any store
#[derive(Debug)]
pub struct NoteService<S> {
    store: S,
}

impl<S: Store> NoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create `note`. A nil id is replaced by a fresh v4 UUID; a caller-chosen
    /// id must not exist yet. `created_time` is always stamped here.
    pub fn create(&self, ctx: &Context, note: &Note) -> Result<Note> {
        let mut note = note.clone();

        if note.has_id() {
            if self.exists(ctx, note.id)? {
                return Err(StoreError::AlreadyExists(note.id));
            }
        } else {
            note.id = Uuid::new_v4();
        }

        note.created_time = Some(Utc::now());
        note.updated_time = None;

        self.store.insert(ctx, &note)?;
        tracing::debug!(id = %note.id, "created note");
        Ok(note)
    }

    /// Merge present fields of `note` into the existing note and stamp
    /// `updated_time`.
    pub fn update(&self, ctx: &Context, note: &Note) -> Result<Note> {
        if !note.has_id() {
            return Err(StoreError::EmptyIdentifier);
        }
        if !self.exists(ctx, note.id)? {
            return Err(StoreError::NotFound(note.id));
        }

        let mut patch = note.clone();
        patch.updated_time = Some(Utc::now());

        let updated = self.store.update(ctx, &patch)?;
        tracing::debug!(id = %updated.id, "updated note");
        Ok(updated)
    }

    pub fn delete(&self, ctx: &Context, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Err(StoreError::EmptyIdentifier);
        }
        self.store.delete(ctx, id)?;
        tracing::debug!(%id, "deleted note");
        Ok(())
    }

    pub fn get(&self, ctx: &Context, id: Uuid) -> Result<Note> {
        if id.is_nil() {
            return Err(StoreError::EmptyIdentifier);
        }
        self.store.get(ctx, id)
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// `NotFound` means absent; every other error propagates
    fn exists(&self, ctx: &Context, id: Uuid) -> Result<bool> {
        match self.store.get(ctx, id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
