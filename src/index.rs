//! In-memory note index
//!
//! A `BTreeMap` from identifier to note behind a single `RwLock`: many
//! concurrent readers, one exclusive writer. The map is the source of truth
//! while the process runs; the durable store only mirrors it to disk.
//!
//! Iteration order is identifier order, which is the order the snapshot
//! file is written in.
//!
//! Stores take the lock through [`NoteIndex::read_within`] and
//! [`NoteIndex::write_within`], which wait in short slices and give up with
//! `Cancelled` as soon as the caller's context fires. A caller parked behind
//! a long write-back is released by its deadline instead of by the writer.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::context::Context;
use crate::error::{Result, StoreError};
use crate::note::Note;

/// Longest single wait for the lock between two context checks
const LOCK_POLL: Duration = Duration::from_millis(2);

/// Lock-guarded identifier → note mapping
#[derive(Debug, Default)]
pub struct NoteIndex {
    notes: RwLock<BTreeMap<Uuid, Note>>,
}

/// Read access, held for the duration of a lookup
pub struct IndexReader<'a> {
    notes: RwLockReadGuard<'a, BTreeMap<Uuid, Note>>,
}

/// Exclusive access, held for a whole mutation (and write-back)
pub struct IndexWriter<'a> {
    notes: RwLockWriteGuard<'a, BTreeMap<Uuid, Note>>,
}

/// How to take back a mutation applied through an [`IndexWriter`]
#[derive(Debug)]
#[must_use]
pub enum Undo {
    /// Nothing was changed
    None,
    /// A note was added; remove it
    Remove(Uuid),
    /// A note was replaced or removed; put this copy back
    Restore(Note),
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from decoded notes. A later duplicate id replaces an
    /// earlier one.
    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let map = notes.into_iter().map(|note| (note.id, note)).collect();
        Self {
            notes: RwLock::new(map),
        }
    }

    pub fn read(&self) -> IndexReader<'_> {
        IndexReader {
            notes: self.notes.read(),
        }
    }

    pub fn write(&self) -> IndexWriter<'_> {
        IndexWriter {
            notes: self.notes.write(),
        }
    }

    /// Shared access, unless `ctx` is cancelled first.
    ///
    /// The context is checked before every attempt and once more after the
    /// lock is held, so a returned guard was acquired by a live context.
    pub fn read_within(&self, ctx: &Context) -> Result<IndexReader<'_>> {
        loop {
            ctx.check()?;
            if let Some(notes) = self.notes.try_read_for(poll_slice(ctx)) {
                ctx.check()?;
                return Ok(IndexReader { notes });
            }
        }
    }

    /// Exclusive access, unless `ctx` is cancelled first
    pub fn write_within(&self, ctx: &Context) -> Result<IndexWriter<'_>> {
        loop {
            ctx.check()?;
            if let Some(notes) = self.notes.try_write_for(poll_slice(ctx)) {
                ctx.check()?;
                return Ok(IndexWriter { notes });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.notes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.read().is_empty()
    }

    /// Copies of every note, in identifier order
    pub fn snapshot(&self) -> Vec<Note> {
        self.notes.read().values().cloned().collect()
    }
}

/// One wait slice, cut short by the context deadline
fn poll_slice(ctx: &Context) -> Duration {
    match ctx.deadline() {
        Some(deadline) => deadline
            .saturating_duration_since(Instant::now())
            .min(LOCK_POLL),
        None => LOCK_POLL,
    }
}

impl IndexReader<'_> {
    /// An independent copy of the note with `id`
    pub fn get(&self, id: &Uuid) -> Result<Note> {
        self.notes.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

impl IndexWriter<'_> {
    /// Store a copy of `note`. Fails if the id is already present.
    pub fn insert(&mut self, note: &Note) -> Result<Undo> {
        if self.notes.contains_key(&note.id) {
            return Err(StoreError::AlreadyExists(note.id));
        }
        self.notes.insert(note.id, note.clone());
        Ok(Undo::Remove(note.id))
    }

    /// Merge present fields of `note` into the stored note.
    ///
    /// Returns a copy of the merged note.
    pub fn update(&mut self, note: &Note) -> Result<(Note, Undo)> {
        let existing = self
            .notes
            .get_mut(&note.id)
            .ok_or(StoreError::NotFound(note.id))?;

        let previous = existing.clone();
        existing.merge_from(note);
        Ok((existing.clone(), Undo::Restore(previous)))
    }

    /// Remove the note with `id`. Absence is not an error.
    pub fn delete(&mut self, id: &Uuid) -> Undo {
        match self.notes.remove(id) {
            Some(removed) => Undo::Restore(removed),
            None => Undo::None,
        }
    }

    /// Replace the whole contents with `notes`. A later duplicate id wins.
    pub fn load(&mut self, notes: impl IntoIterator<Item = Note>) {
        self.notes.clear();
        self.notes.extend(notes.into_iter().map(|note| (note.id, note)));
    }

    pub fn rollback(&mut self, undo: Undo) {
        match undo {
            Undo::None => {}
            Undo::Remove(id) => {
                self.notes.remove(&id);
            }
            Undo::Restore(note) => {
                self.notes.insert(note.id, note);
            }
        }
    }

    /// Notes in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate() {
        let index = NoteIndex::new();
        let note = Note::new(Uuid::new_v4()).with_title("a");

        let _ = index.write().insert(&note).unwrap();
        let err = index.write().insert(&note.clone().with_title("b")).unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists(id) if id == note.id));
        assert_eq!(index.read().get(&note.id).unwrap().title(), "a");
    }

    #[test]
    fn test_rollback_each_mutation() {
        let index = NoteIndex::new();
        let note = Note::new(Uuid::new_v4()).with_title("a");

        let mut writer = index.write();
        let undo = writer.insert(&note).unwrap();
        writer.rollback(undo);
        assert!(writer.is_empty());

        let _ = writer.insert(&note).unwrap();
        let (merged, undo) = writer.update(&Note::new(note.id).with_title("b")).unwrap();
        assert_eq!(merged.title(), "b");
        writer.rollback(undo);

        let undo = writer.delete(&note.id);
        assert!(writer.is_empty());
        writer.rollback(undo);
        drop(writer);

        assert_eq!(index.read().get(&note.id).unwrap(), note);
    }

    #[test]
    fn test_write_within_gives_up_on_timeout() {
        let index = NoteIndex::new();
        let _held = index.write();
        let ctx = Context::background().with_timeout(Duration::from_millis(20));

        let started = Instant::now();
        let err = index.write_within(&ctx).err().unwrap();

        assert!(matches!(err, StoreError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_read_within_gives_up_on_cancel() {
        let index = NoteIndex::new();
        let held = index.write();
        let (ctx, handle) = Context::with_cancel();

        let err = std::thread::scope(|s| {
            let waiter = s.spawn(|| index.read_within(&ctx).err());
            std::thread::sleep(Duration::from_millis(20));
            handle.cancel();
            waiter.join().unwrap()
        });
        drop(held);

        assert!(matches!(err, Some(StoreError::Cancelled)));
    }

    #[test]
    fn test_within_acquires_free_lock() {
        let index = NoteIndex::new();
        let note = Note::new(Uuid::new_v4());
        let ctx = Context::background();

        let _ = index.write_within(&ctx).unwrap().insert(&note).unwrap();
        assert_eq!(index.read_within(&ctx).unwrap().get(&note.id).unwrap(), note);
    }

    #[test]
    fn test_from_notes_orders_by_id() {
        let mut ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
        let index = NoteIndex::from_notes(ids.iter().map(|id| Note::new(*id)));
        ids.sort();

        let snapshot: Vec<Uuid> = index.snapshot().iter().map(|n| n.id).collect();
        assert_eq!(snapshot, ids);
    }
}
