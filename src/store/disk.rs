//! Persistent backend using fjall.

use std::path::{Path, PathBuf};

use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};

use crate::logging::{debug, error, info, trace};

use super::error::StoreError;
use super::format;
use super::types::StoredValue;
use super::{AccessMode, Backend, BackendProvider, Batch, BatchOp, ClearHandle};

/// Metadata keyspace and the key holding the on-disk layout version.
const META_KEYSPACE: &str = "_meta";
const META_CONFIG_KEY: &str = "config";

/// Keyspace holding the preference values.
const DATA_KEYSPACE: &str = "prefs";

/// Current store layout version.
/// Increment this when changing the keyspace layout or record format.
/// Opening a database written with a different version fails.
const STORE_VERSION: u32 = 1;

/// A preference store persisted with fjall.
///
/// Each namespace is a separate fjall database in its own directory. Every
/// commit is persisted with [`PersistMode::SyncAll`] before it returns.
///
/// ```ignore
/// use typed_prefs::store::{AccessMode, Backend, Batch, FjallBackend, StoredValue};
///
/// let backend = FjallBackend::open("./prefs/settings", AccessMode::Private)?;
/// let mut batch = Batch::new();
/// batch.put("volume", StoredValue::Int(7));
/// backend.commit(batch)?;
/// ```
#[derive(Clone)]
pub struct FjallBackend {
    db: fjall::Database,
    data: Keyspace,
}

impl FjallBackend {
    /// Open the store at `path`, creating it if it does not exist.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self, StoreError> {
        let path = path.as_ref();
        debug!(path = %path.display(), mode = ?mode, "opening preference store");

        std::fs::create_dir_all(path)?;
        apply_access_mode(path, mode)?;

        let db = fjall::Database::builder(path).open()?;
        let meta = db.keyspace(META_KEYSPACE, KeyspaceCreateOptions::default)?;

        match meta.get(META_CONFIG_KEY)? {
            Some(config) => {
                let version = u32::from_le_bytes(config.as_ref().try_into().map_err(|_| {
                    StoreError::Corrupt("invalid store config record".to_string())
                })?);
                if version != STORE_VERSION {
                    error!(
                        stored_version = version,
                        expected_version = STORE_VERSION,
                        "store version mismatch"
                    );
                    return Err(StoreError::VersionMismatch {
                        expected: STORE_VERSION,
                        found: version,
                    });
                }
                trace!(version = version, "store version verified");
            }
            None => {
                meta.insert(META_CONFIG_KEY, STORE_VERSION.to_le_bytes())?;
                db.persist(PersistMode::SyncAll)?;
                trace!(version = STORE_VERSION, "store initialized");
            }
        }

        let data = db.keyspace(DATA_KEYSPACE, KeyspaceCreateOptions::default)?;

        info!(path = %path.display(), "preference store opened");
        Ok(Self { db, data })
    }
}

impl Backend for FjallBackend {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let Some(bytes) = self.data.get(key)? else {
            return Ok(None);
        };
        format::decode(&bytes).map(Some)
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.data.contains_key(key)?)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for kv in self.data.iter() {
            let key = kv.key()?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }

    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let len = batch.len();
        let mut write = self.db.batch();
        for (key, op) in batch.into_ops() {
            match op {
                BatchOp::Put(value) => write.insert(&self.data, key, format::encode(&value)?),
                BatchOp::Remove => write.remove(&self.data, key),
            }
        }
        write.commit()?;
        self.db.persist(PersistMode::SyncAll)?;

        trace!(ops = len, "batch committed");
        Ok(())
    }

    fn clear(&self) -> ClearHandle {
        if let Err(e) = self.remove_every_key() {
            error!(error = %e, "clear failed");
            return ClearHandle::settled(Err(e));
        }

        let db = self.db.clone();
        ClearHandle::spawn(move || {
            db.persist(PersistMode::SyncAll)?;
            trace!("clear persisted");
            Ok(())
        })
    }
}

impl FjallBackend {
    /// Remove every key in one batch, without waiting for it to reach disk.
    fn remove_every_key(&self) -> Result<(), StoreError> {
        let keys = self
            .data
            .iter()
            .map(|kv| kv.key().map(|k| k.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        trace!(key_count = keys.len(), "clearing keys");

        let mut write = self.db.batch();
        for key in keys {
            write.remove(&self.data, key);
        }
        write.commit()?;
        Ok(())
    }
}

/// Opens [`FjallBackend`]s under a root directory, one subdirectory per namespace.
#[derive(Debug, Clone)]
pub struct FjallProvider {
    root: PathBuf,
}

impl FjallProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BackendProvider for FjallProvider {
    type Backend = FjallBackend;

    fn open(&self, namespace: &str, mode: AccessMode) -> Result<FjallBackend, StoreError> {
        if namespace.is_empty()
            || namespace == "."
            || namespace == ".."
            || namespace.contains(['/', '\\'])
        {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid namespace name '{namespace}'"),
            )));
        }
        FjallBackend::open(self.root.join(namespace), mode)
    }
}

#[cfg(unix)]
fn apply_access_mode(path: &Path, mode: AccessMode) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let bits = match mode {
        AccessMode::Private => 0o700,
        AccessMode::Shared => 0o755,
    };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(bits))?;
    Ok(())
}

#[cfg(not(unix))]
fn apply_access_mode(_path: &Path, _mode: AccessMode) -> Result<(), StoreError> {
    Ok(())
}
