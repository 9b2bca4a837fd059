//! Error types for notestore
//!
//! Provides a unified error type for all store, codec and service operations.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for notestore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("note {0} already exists")]
    AlreadyExists(Uuid),

    #[error("note {0} not found")]
    NotFound(Uuid),

    #[error("operation cancelled")]
    Cancelled,

    #[error("note id must not be empty")]
    EmptyIdentifier,

    /// Hydration of a file store failed; every later call sees the same error.
    #[error("store initialization failed: {0}")]
    Initialization(Arc<StoreError>),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("incomplete write: wrote {written} of {expected} bytes")]
    IncompleteWrite { written: usize, expected: usize },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`StoreError`], used by transports to pick a
/// response without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    Cancelled,
    EmptyIdentifier,
    Internal,
}

impl StoreError {
    /// Classify this error. Initialization failures report the kind of the
    /// underlying cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Cancelled => ErrorKind::Cancelled,
            StoreError::EmptyIdentifier => ErrorKind::EmptyIdentifier,
            StoreError::Initialization(cause) => cause.kind(),
            StoreError::Truncated { .. }
            | StoreError::Malformed(_)
            | StoreError::IncompleteWrite { .. }
            | StoreError::Io(_)
            | StoreError::Config(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status an API layer should answer with.
    ///
    /// 499 is the nginx "client closed request" convention.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::AlreadyExists => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Cancelled => 499,
            ErrorKind::EmptyIdentifier => 400,
            ErrorKind::Internal => 500,
        }
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        StoreError::Malformed(err.to_string())
    }
}
