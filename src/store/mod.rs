//! Store Module
//!
//! Concurrency-safe CRUD over notes.
//!
//! ## Implementations
//! - [`MemoryStore`]: the index alone, no persistence
//! - [`FileStore`]: the index mirrored to a single snapshot file, hydrated
//!   lazily on first use and fully rewritten after every mutation
//!
//! ## Operation Flow
//! ```text
//! ctx check → (hydrate once) → wait for index lock → ctx check → mutate → write-back
//!                                   (ctx checked                       └── rollback on failure
//!                                    between slices)
//! ```
//! Cancellation is honoured up to and including lock acquisition. Past the
//! last check the operation completes and reports its real outcome.

mod file;
mod memory;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{Backend, Config};
use crate::context::Context;
use crate::error::Result;
use crate::note::Note;

pub use file::{FileStore, StoreState};
pub use memory::MemoryStore;

/// The contract every store implements. Returned notes are always
/// independent copies of the stored ones.
pub trait Store: Send + Sync {
    /// Add `note`. Fails with `AlreadyExists` if its id is present,
    /// `EmptyIdentifier` if the id is nil.
    fn insert(&self, ctx: &Context, note: &Note) -> Result<()>;

    /// Merge present fields of `note` into the stored note with the same id and
    /// return the result. Fails with `NotFound` if absent.
    fn update(&self, ctx: &Context, note: &Note) -> Result<Note>;

    /// Remove the note with `id`. Deleting an absent id succeeds.
    fn delete(&self, ctx: &Context, id: Uuid) -> Result<()>;

    /// A copy of the note with `id`. Fails with `NotFound` if absent.
    fn get(&self, ctx: &Context, id: Uuid) -> Result<Note>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn insert(&self, ctx: &Context, note: &Note) -> Result<()> {
        (**self).insert(ctx, note)
    }

    fn update(&self, ctx: &Context, note: &Note) -> Result<Note> {
        (**self).update(ctx, note)
    }

    fn delete(&self, ctx: &Context, id: Uuid) -> Result<()> {
        (**self).delete(ctx, id)
    }

    fn get(&self, ctx: &Context, id: Uuid) -> Result<Note> {
        (**self).get(ctx, id)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn insert(&self, ctx: &Context, note: &Note) -> Result<()> {
        (**self).insert(ctx, note)
    }

    fn update(&self, ctx: &Context, note: &Note) -> Result<Note> {
        (**self).update(ctx, note)
    }

    fn delete(&self, ctx: &Context, id: Uuid) -> Result<()> {
        (**self).delete(ctx, id)
    }

    fn get(&self, ctx: &Context, id: Uuid) -> Result<Note> {
        (**self).get(ctx, id)
    }
}

/// Open the store selected by `config.backend`
pub fn open(config: &Config) -> Result<Box<dyn Store>> {
    match config.backend {
        Backend::File => Ok(Box::new(FileStore::open_with_config(config)?)),
        Backend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}
