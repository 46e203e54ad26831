//! Error types for the memory core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MemoryError`].
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors surfaced by stores and the tier coordinator.
#[derive(Error, Debug)]
pub enum MemoryError {
    // Caller errors: the operation had no effect
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("unknown layer: {0}")]
    UnknownCategory(String),

    // Storage errors
    #[error("storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("memory coordinator is closed")]
    Closed,
}

impl MemoryError {
    /// Shorthand for a [`MemoryError::Validation`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` for errors caused by the caller's input rather than by storage.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownCategory(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for MemoryError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::LockPoisoned
    }
}
