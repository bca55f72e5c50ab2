//! Error types for the storage backends.

use thiserror::Error;

/// Errors raised by a [`Backend`](super::Backend).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "fjall")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store version mismatch: expected {expected}, got {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Store is read-only")]
    ReadOnly,

    #[error("Background task failed: {0}")]
    BackgroundTask(String),
}
