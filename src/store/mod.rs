//! Storage backends for the preference facade.
//!
//! A [`Backend`] is the underlying key-value store: it holds values of the
//! closed set of [`ValueKind`]s, commits a [`Batch`] atomically, and clears
//! itself with durability deferred to a background thread. A [`BackendProvider`] opens backends by
//! namespace name and [`AccessMode`].
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryBackend`]: process-local, used for tests and ephemeral stores
//! - [`FjallBackend`]: persistent, one fjall database per namespace (requires `fjall` feature)

mod error;
#[cfg(feature = "fjall")]
mod disk;
pub mod format;
mod memory;
mod types;

use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};

pub use error::StoreError;
#[cfg(feature = "fjall")]
pub use disk::{FjallBackend, FjallProvider};
pub use memory::{MemoryBackend, MemoryProvider};
pub use types::{StoredValue, ValueKind};

/// Who may access a namespace's data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Only the owning user.
    #[default]
    Private,
    /// Readable by other users of the machine.
    Shared,
}

/// A single staged change.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put(StoredValue),
    Remove,
}

/// Changes staged for one atomic commit, applied in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    ops: Vec<(String, BatchOp)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: StoredValue) -> &mut Self {
        self.ops.push((key.into(), BatchOp::Put(value)));
        self
    }

    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push((key.into(), BatchOp::Remove));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BatchOp)> {
        self.ops.iter().map(|(k, op)| (k.as_str(), op))
    }

    pub fn into_ops(self) -> Vec<(String, BatchOp)> {
        self.ops
    }
}

/// The underlying key-value store.
///
/// Implementations provide their own concurrency control; the facade on top
/// holds no locks.
pub trait Backend: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// All stored keys in ascending order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Apply every operation of `batch` atomically and durably.
    ///
    /// Returns only once the commit is confirmed. Either all operations
    /// become visible or none do.
    fn commit(&self, batch: Batch) -> Result<(), StoreError>;

    /// Remove every key.
    ///
    /// The removal is visible to every read and commit issued after this
    /// returns, so a later commit is never erased by it. Only making the
    /// removal durable may continue in the background; the handle tracks it.
    fn clear(&self) -> ClearHandle;
}

/// Opens backends by namespace name.
pub trait BackendProvider {
    type Backend: Backend;

    fn open(&self, namespace: &str, mode: AccessMode) -> Result<Self::Backend, StoreError>;
}

/// Completion handle for the durable part of a clear.
///
/// Dropping the handle detaches the background work; it still runs to
/// completion.
#[derive(Debug)]
pub struct ClearHandle {
    state: ClearState,
}

#[derive(Debug)]
enum ClearState {
    Running(JoinHandle<Result<(), StoreError>>),
    Settled(Result<(), StoreError>),
}

impl ClearHandle {
    /// Run `clear` on a new thread.
    ///
    /// When no thread can be spawned `clear` runs on the calling thread and
    /// the returned handle is already settled.
    pub fn spawn<F>(clear: F) -> Self
    where
        F: FnOnce() -> Result<(), StoreError> + Send + 'static,
    {
        // The closure is moved into the builder, so keep a slot to recover it
        // if spawning fails.
        let slot = std::sync::Arc::new(parking_lot::Mutex::new(Some(clear)));
        let thread_slot = std::sync::Arc::clone(&slot);

        let spawned = std::thread::Builder::new()
            .name("prefs-clear".to_string())
            .spawn(move || match thread_slot.lock().take() {
                Some(clear) => clear(),
                None => Ok(()),
            });

        match spawned {
            Ok(handle) => Self {
                state: ClearState::Running(handle),
            },
            Err(_) => {
                let result = match slot.lock().take() {
                    Some(clear) => clear(),
                    None => Ok(()),
                };
                Self::settled(result)
            }
        }
    }

    /// A handle for a clear that has already finished.
    pub fn settled(result: Result<(), StoreError>) -> Self {
        Self {
            state: ClearState::Settled(result),
        }
    }

    /// Whether the clear has finished.
    pub fn is_settled(&self) -> bool {
        match &self.state {
            ClearState::Running(handle) => handle.is_finished(),
            ClearState::Settled(_) => true,
        }
    }

    /// Block until the clear has finished and return its outcome.
    pub fn wait(self) -> Result<(), StoreError> {
        match self.state {
            ClearState::Running(handle) => handle
                .join()
                .map_err(|_| StoreError::BackgroundTask("clear thread panicked".to_string()))?,
            ClearState::Settled(result) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_keeps_insertion_order() {
        let mut batch = Batch::new();
        batch
            .put("b", StoredValue::Int(1))
            .remove("a")
            .put("a", StoredValue::Bool(true));

        let keys: Vec<&str> = batch.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "a"]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_clear_handle_reports_outcome() {
        let handle = ClearHandle::spawn(|| Ok(()));
        assert!(handle.wait().is_ok());

        let handle = ClearHandle::spawn(|| Err(StoreError::Corrupt("boom".to_string())));
        assert!(matches!(handle.wait(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_settled_handle() {
        let handle = ClearHandle::settled(Ok(()));
        assert!(handle.is_settled());
        assert!(handle.wait().is_ok());
    }
}
