//! Durable store
//!
//! The index mirrored to a single snapshot file.
//!
//! ## Lifecycle
//! ```text
//! Uninitialized ──first op──▶ Hydrating ──decoded──▶ Ready
//!                                 │
//!                                 └──error──▶ Failed (terminal)
//! ```
//! Hydration runs exactly once, behind a `OnceLock`. Concurrent first callers
//! wait for it; callers after a failed hydration all receive the same error.
//!
//! ## Write-back
//! After every successful insert, update or delete (of a present note) the
//! whole index is re-encoded in identifier order and replaces the file
//! contents before the operation returns. The file therefore always holds
//! exactly one frame per stored note. If write-back fails the in-memory
//! mutation is rolled back and the error is returned.
//!
//! In atomic mode the rename is the commit point. A failure before it rolls
//! back; once the new snapshot has replaced the old one the mutation stands,
//! and a failed directory fsync afterwards is only logged.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::codec;
use crate::config::{Config, WriteMode};
use crate::context::Context;
use crate::error::{Result, StoreError};
use crate::index::{IndexWriter, NoteIndex, Undo};
use crate::note::Note;

use super::Store;

/// Observable hydration state of a [`FileStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Hydrating,
    Ready,
    Failed,
}

/// File-backed implementation of [`Store`]
///
/// ## Concurrency
/// - `index`: RwLock; reads share it, mutations hold the write side through
///   write-back so file contents and index never diverge between callers
/// - `file`: Mutex, only ever taken while the index write lock (or the
///   hydration gate) is held
/// - `hydration`: one-shot gate storing the outcome of the first load
pub struct FileStore {
    path: PathBuf,
    write_mode: WriteMode,
    sync_on_write: bool,

    file: Mutex<File>,
    index: NoteIndex,

    hydration: OnceLock<std::result::Result<(), Arc<StoreError>>>,
    hydrating: AtomicBool,

    dir_sync: fn(&Path) -> Result<()>,
}

impl FileStore {
    /// Open or create the snapshot file at `path`.
    ///
    /// Nothing is read yet; the file is loaded on the first operation.
    pub fn open(
        path: impl AsRef<Path>,
        write_mode: WriteMode,
        sync_on_write: bool,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        tracing::info!(path = %path.display(), ?write_mode, "opened note file");

        Ok(Self {
            path,
            write_mode,
            sync_on_write,
            file: Mutex::new(file),
            index: NoteIndex::new(),
            hydration: OnceLock::new(),
            hydrating: AtomicBool::new(false),
            dir_sync: sync_dir,
        })
    }

    /// Open `{data_dir}/notes.db`, creating the directory if needed
    pub fn open_with_config(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;
        Self::open(config.notes_path(), config.write_mode, config.sync_on_write)
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Hydrate on first call; afterwards return the remembered outcome
    fn ensure_ready(&self) -> Result<()> {
        let outcome = self.hydration.get_or_init(|| {
            self.hydrating.store(true, Ordering::Release);
            let result = self.hydrate().map_err(Arc::new);
            self.hydrating.store(false, Ordering::Release);
            result
        });

        match outcome {
            Ok(()) => Ok(()),
            Err(e) => Err(StoreError::Initialization(Arc::clone(e))),
        }
    }

    fn hydrate(&self) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;
        let notes = codec::decode_all(BufReader::new(&mut *file)).collect::<Result<Vec<_>>>();
        drop(file);

        let notes = match notes {
            Ok(notes) => notes,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to hydrate note store");
                return Err(e);
            }
        };

        let count = notes.len();
        self.index.write().load(notes);

        tracing::info!(path = %self.path.display(), notes = count, "hydrated note store");
        Ok(())
    }

    pub fn state(&self) -> StoreState {
        match self.hydration.get() {
            Some(Ok(())) => StoreState::Ready,
            Some(Err(_)) => StoreState::Failed,
            None if self.hydrating.load(Ordering::Acquire) => StoreState::Hydrating,
            None => StoreState::Uninitialized,
        }
    }

    // =========================================================================
    // Write-back
    // =========================================================================

    /// Write back after a mutation, rolling it back if that fails
    fn commit(&self, notes: &mut IndexWriter<'_>, undo: Undo) -> Result<()> {
        let err = match self.write_back(notes) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        tracing::warn!(path = %self.path.display(), error = %err, "write-back failed, rolling back");
        notes.rollback(undo);

        // An in-place rewrite may have left the file truncated; try to
        // restore it to the rolled-back contents.
        if self.write_mode == WriteMode::InPlace {
            if let Err(restore) = self.write_back(notes) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %restore,
                    "could not restore note file after failed write-back"
                );
            }
        }

        Err(err)
    }

    fn write_back(&self, notes: &IndexWriter<'_>) -> Result<()> {
        let mut file = self.file.lock();

        let bytes = match self.write_mode {
            WriteMode::AtomicReplace => self.replace_atomically(&mut file, notes)?,
            WriteMode::InPlace => self.rewrite_in_place(&mut file, notes)?,
        };

        tracing::debug!(notes = notes.len(), bytes, "wrote note snapshot");
        Ok(())
    }

    /// Truncate, rewind, rewrite. Not crash-atomic.
    fn rewrite_in_place(&self, file: &mut File, notes: &IndexWriter<'_>) -> Result<usize> {
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;

        let mut writer = BufWriter::new(&mut *file);
        let bytes = codec::encode_all(&mut writer, notes.iter())?;
        writer.flush()?;
        drop(writer);

        if self.sync_on_write {
            file.sync_all()?;
        }
        Ok(bytes)
    }

    /// Encode into a sibling temp file, then rename it over the snapshot and
    /// adopt its handle.
    fn replace_atomically(&self, file: &mut File, notes: &IndexWriter<'_>) -> Result<usize> {
        let dir = self.parent_dir();
        let mut tmp = NamedTempFile::new_in(dir)?;

        let bytes = {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            let bytes = codec::encode_all(&mut writer, notes.iter())?;
            writer.flush()?;
            bytes
        };

        fs::set_permissions(tmp.path(), file.metadata()?.permissions())?;
        if self.sync_on_write {
            tmp.as_file().sync_all()?;
        }

        *file = tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        if self.sync_on_write {
            if let Err(e) = (self.dir_sync)(dir) {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %e,
                    "note file replaced but directory sync failed"
                );
            }
        }
        Ok(bytes)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Copies of every note, in identifier order. Hydrates if needed.
    pub fn notes(&self) -> Result<Vec<Note>> {
        self.ensure_ready()?;
        Ok(self.index.snapshot())
    }

    /// Number of stored notes. Hydrates if needed.
    pub fn len(&self) -> Result<usize> {
        self.ensure_ready()?;
        Ok(self.index.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Close the store, syncing the file handle
    pub fn close(self) -> Result<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }
}

impl Store for FileStore {
    fn insert(&self, ctx: &Context, note: &Note) -> Result<()> {
        ctx.check()?;
        self.ensure_ready()?;
        if !note.has_id() {
            return Err(StoreError::EmptyIdentifier);
        }

        let mut notes = self.index.write_within(ctx)?;
        let undo = notes.insert(note)?;
        self.commit(&mut notes, undo)?;

        tracing::trace!(id = %note.id, "inserted note");
        Ok(())
    }

    fn update(&self, ctx: &Context, note: &Note) -> Result<Note> {
        ctx.check()?;
        self.ensure_ready()?;
        if !note.has_id() {
            return Err(StoreError::EmptyIdentifier);
        }

        let mut notes = self.index.write_within(ctx)?;
        let (merged, undo) = notes.update(note)?;
        self.commit(&mut notes, undo)?;

        tracing::trace!(id = %note.id, "updated note");
        Ok(merged)
    }

    fn delete(&self, ctx: &Context, id: Uuid) -> Result<()> {
        ctx.check()?;
        self.ensure_ready()?;

        let mut notes = self.index.write_within(ctx)?;
        match notes.delete(&id) {
            // Nothing changed, the file is already current.
            Undo::None => {}
            undo => self.commit(&mut notes, undo)?,
        }

        tracing::trace!(%id, "deleted note");
        Ok(())
    }

    fn get(&self, ctx: &Context, id: Uuid) -> Result<Note> {
        ctx.check()?;
        self.ensure_ready()?;

        let notes = self.index.read_within(ctx)?;
        notes.get(&id)
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("write_mode", &self.write_mode)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
