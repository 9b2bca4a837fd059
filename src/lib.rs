//! # notestore
//!
//! An embedded note store with:
//! - A lock-guarded in-memory index as the source of truth
//! - Cooperative cancellation of every operation
//! - A durable variant that lazily hydrates from, and fully rewrites, a single
//!   file of length-prefixed binary frames
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NoteService                             │
//! │          (id assignment, timestamps, existence)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  insert / update / delete / get
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ MemoryStore │          │  FileStore  │
//!   │             │          │ (hydrate 1x)│
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────┐          ┌─────────────┐       ┌─────────────┐
//!   │  NoteIndex  │          │  NoteIndex  │──────▶│    Codec    │
//!   │  (RwLock)   │          │  (RwLock)   │       │ (LE frames) │
//!   └─────────────┘          └─────────────┘       └──────┬──────┘
//!                                                         ▼
//!                                                    notes.db
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod note;
pub mod context;
pub mod codec;
pub mod index;
pub mod store;
pub mod service;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ErrorKind, Result, StoreError};
pub use config::Config;
pub use context::{CancelHandle, Context};
pub use note::Note;
pub use store::{FileStore, MemoryStore, Store};
pub use service::NoteService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of notestore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
