//! In-memory backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};

use super::error::StoreError;
use super::types::StoredValue;
use super::{AccessMode, Backend, BackendProvider, Batch, BatchOp, ClearHandle};

/// A process-local store.
///
/// Clones share the same data. Commits are atomic under a single write lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<BTreeMap<String, StoredValue>>>,
    read_only: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit and clear fail with [`StoreError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.read().contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().keys().cloned().collect())
    }

    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        self.check_writable()?;

        let mut entries = self.entries.write();
        for (key, op) in batch.into_ops() {
            match op {
                BatchOp::Put(value) => {
                    entries.insert(key, value);
                }
                BatchOp::Remove => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn clear(&self) -> ClearHandle {
        let result = self.check_writable().map(|()| self.entries.write().clear());
        ClearHandle::settled(result)
    }
}

/// Opens [`MemoryBackend`]s, one per namespace.
///
/// Opening the same namespace twice returns handles over the same data.
/// The access mode has no effect in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    namespaces: Arc<Mutex<HashMap<String, MemoryBackend>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BackendProvider for MemoryProvider {
    type Backend = MemoryBackend;

    fn open(&self, namespace: &str, _mode: AccessMode) -> Result<MemoryBackend, StoreError> {
        Ok(self
            .namespaces
            .lock()
            .entry(namespace.to_string())
            .or_default()
            .clone())
    }
}
