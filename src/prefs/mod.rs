//! The typed preference facade.
//!
//! [`Preferences`] wraps a [`Backend`] with typed accessors. Scalar saves
//! commit synchronously and report the outcome as a `bool`; fetches return a
//! sentinel default for absent keys:
//!
//! | Kind | Sentinel |
//! |---|---|
//! | string | `None` |
//! | int | [`INT_ABSENT`] (`i32::MIN`) |
//! | long | [`LONG_ABSENT`] (`i64::MIN`) |
//! | float | [`FLOAT_ABSENT`] (smallest positive `f32`) |
//! | bool | `false` |
//! | string set | empty set |
//!
//! A stored sentinel and an absent key look the same; use
//! [`Preferences::contains`] to tell them apart.

mod builder;
mod bulk;
mod serializer;

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::logging::{debug, info, trace, warn};
use crate::store::{AccessMode, Backend, Batch, ClearHandle, StoredValue, ValueKind};

pub use builder::{DEFAULT_NAMESPACE, PreferencesBuilder};
pub use bulk::{BulkWrite, Value};
pub use serializer::{JsonSerializer, NoSerializer, ObjectSupport, Serializer};

/// Returned by [`Preferences::fetch_integer`] for an absent key.
pub const INT_ABSENT: i32 = i32::MIN;

/// Returned by [`Preferences::fetch_long`] for an absent key.
pub const LONG_ABSENT: i64 = i64::MIN;

/// Returned by [`Preferences::fetch_float`] for an absent key: the smallest
/// positive subnormal `f32` (about `1.4e-45`).
pub const FLOAT_ABSENT: f32 = f32::from_bits(1);

/// A typed handle over one preference namespace.
///
/// `S` is the serializer capability. Handles built without object support
/// use [`NoSerializer`] and expose no object methods.
///
/// ```ignore
/// use typed_prefs::prelude::*;
///
/// let prefs = PreferencesBuilder::new(FjallProvider::new(".typed-prefs"))
///     .having_namespace("settings")
///     .with_object_storage_support()
///     .build()?;
///
/// prefs.save_integer("volume", 7);
/// assert_eq!(prefs.fetch_integer("volume")?, 7);
/// assert_eq!(prefs.fetch_integer("missing")?, INT_ABSENT);
/// ```
pub struct Preferences<B, S = NoSerializer> {
    backend: B,
    namespace: String,
    mode: AccessMode,
    serializer: S,
}

impl<B, S> fmt::Debug for Preferences<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("namespace", &self.namespace)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<B: Backend, S> Preferences<B, S> {
    /// Wrap an already opened backend.
    pub fn new(backend: B, namespace: impl Into<String>, mode: AccessMode, serializer: S) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            mode,
            serializer,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn save_string(&self, key: &str, value: &str) -> bool {
        self.save(key, StoredValue::String(value.to_string()))
    }

    /// Fetch a string, or `None` if the key is absent.
    pub fn fetch_string(&self, key: &str) -> Result<Option<String>> {
        match self.fetch(key, ValueKind::String)? {
            Some(StoredValue::String(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    pub fn save_integer(&self, key: &str, value: i32) -> bool {
        self.save(key, StoredValue::Int(value))
    }

    /// Fetch a 32-bit integer, or [`INT_ABSENT`] if the key is absent.
    pub fn fetch_integer(&self, key: &str) -> Result<i32> {
        match self.fetch(key, ValueKind::Int)? {
            Some(StoredValue::Int(v)) => Ok(v),
            _ => Ok(INT_ABSENT),
        }
    }

    pub fn save_long(&self, key: &str, value: i64) -> bool {
        self.save(key, StoredValue::Long(value))
    }

    /// Fetch a 64-bit integer, or [`LONG_ABSENT`] if the key is absent.
    pub fn fetch_long(&self, key: &str) -> Result<i64> {
        match self.fetch(key, ValueKind::Long)? {
            Some(StoredValue::Long(v)) => Ok(v),
            _ => Ok(LONG_ABSENT),
        }
    }

    pub fn save_float(&self, key: &str, value: f32) -> bool {
        self.save(key, StoredValue::Float(value))
    }

    /// Fetch a float, or [`FLOAT_ABSENT`] if the key is absent.
    pub fn fetch_float(&self, key: &str) -> Result<f32> {
        match self.fetch(key, ValueKind::Float)? {
            Some(StoredValue::Float(v)) => Ok(v),
            _ => Ok(FLOAT_ABSENT),
        }
    }

    pub fn save_boolean(&self, key: &str, value: bool) -> bool {
        self.save(key, StoredValue::Bool(value))
    }

    /// Fetch a boolean, or `false` if the key is absent.
    pub fn fetch_boolean(&self, key: &str) -> Result<bool> {
        match self.fetch(key, ValueKind::Bool)? {
            Some(StoredValue::Bool(v)) => Ok(v),
            _ => Ok(false),
        }
    }

    pub fn save_string_set(&self, key: &str, value: BTreeSet<String>) -> bool {
        self.save(key, StoredValue::StringSet(value))
    }

    /// Fetch a set of strings, or an empty set if the key is absent.
    pub fn fetch_string_set(&self, key: &str) -> Result<BTreeSet<String>> {
        match self.fetch(key, ValueKind::StringSet)? {
            Some(StoredValue::StringSet(set)) => Ok(set),
            _ => Ok(BTreeSet::new()),
        }
    }

    /// Remove a single key. Returns whether the commit succeeded.
    pub fn remove_data(&self, key: &str) -> bool {
        debug!(namespace = %self.namespace, key = key, "removing key");
        let mut batch = Batch::new();
        batch.remove(key);
        self.commit(batch)
    }

    /// Remove every key.
    ///
    /// Saves made after this returns are kept. Writing the removal to disk
    /// may continue in the background; call [`ClearHandle::wait`] to block
    /// until it is durable and to see whether it succeeded.
    pub fn remove_all(&self) -> ClearHandle {
        info!(namespace = %self.namespace, "clearing preferences");
        self.backend.clear()
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.backend.contains(key)?)
    }

    /// Every stored key, in ascending order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.backend.keys()?)
    }

    fn save(&self, key: &str, value: StoredValue) -> bool {
        debug!(namespace = %self.namespace, key = key, kind = %value.kind(), "saving value");
        let mut batch = Batch::new();
        batch.put(key, value);
        self.commit(batch)
    }

    /// Commit a batch, reporting failure as `false`.
    #[cfg_attr(not(feature = "logging"), allow(unused_variables))]
    fn commit(&self, batch: Batch) -> bool {
        let ops = batch.len();
        match self.backend.commit(batch) {
            Ok(()) => {
                trace!(namespace = %self.namespace, ops = ops, "commit confirmed");
                true
            }
            Err(e) => {
                warn!(namespace = %self.namespace, ops = ops, error = %e, "commit failed");
                false
            }
        }
    }

    /// Read a key, failing if it holds a value of another kind.
    fn fetch(&self, key: &str, expected: ValueKind) -> Result<Option<StoredValue>> {
        let Some(value) = self.backend.get(key)? else {
            trace!(namespace = %self.namespace, key = key, "key absent");
            return Ok(None);
        };
        if value.kind() != expected {
            return Err(Error::KindMismatch {
                key: key.to_string(),
                expected,
                found: value.kind(),
            });
        }
        Ok(Some(value))
    }
}

impl<B: Backend, S: Serializer> Preferences<B, S> {
    /// Encode `value` with the serializer and store the text under `key`.
    ///
    /// Fails with [`Error::UnsupportedValueKind`] if the value cannot be
    /// encoded; a refused commit is `Ok(false)`.
    pub fn save_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<bool> {
        let text = self.serializer.encode(value).map_err(|e| match e {
            Error::Json(e) => Error::unsupported(key, e.to_string()),
            other => other,
        })?;
        Ok(self.save(key, StoredValue::String(text)))
    }

    /// Decode the object stored under `key` as `T`, or `None` if absent.
    ///
    /// `T` must match the shape that was saved; nothing in the stored text
    /// records it.
    pub fn fetch_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        if !self.serializer.is_configured() {
            return Err(Error::CapabilityNotConfigured);
        }
        match self.fetch(key, ValueKind::String)? {
            Some(StoredValue::String(text)) => Ok(Some(self.serializer.decode(&text)?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::store::{MemoryBackend, MemoryProvider};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct CustomObject {
        name: String,
        age: String,
    }

    fn prefs() -> Preferences<MemoryBackend, JsonSerializer> {
        Preferences::new(
            MemoryBackend::new(),
            DEFAULT_NAMESPACE,
            AccessMode::Private,
            JsonSerializer,
        )
    }

    #[test]
    fn test_sentinels_for_absent_keys() -> Result<()> {
        let prefs = prefs();
        assert_eq!(prefs.fetch_string("missing")?, None);
        assert_eq!(prefs.fetch_integer("missing")?, i32::MIN);
        assert_eq!(prefs.fetch_long("missing")?, i64::MIN);
        assert_eq!(prefs.fetch_float("missing")?.to_bits(), 1);
        assert!(!prefs.fetch_boolean("missing")?);
        assert!(prefs.fetch_string_set("missing")?.is_empty());
        assert_eq!(prefs.fetch_object::<CustomObject>("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_scalar_round_trips() -> Result<()> {
        let prefs = prefs();
        assert!(prefs.save_string("String", "this is saved String"));
        assert!(prefs.save_long("Long", 100));
        assert!(prefs.save_float("Float", 1000.1));
        assert!(prefs.save_integer("Integer", 10));
        assert!(prefs.save_boolean("isDataSaved", true));

        assert_eq!(
            prefs.fetch_string("String")?.as_deref(),
            Some("this is saved String")
        );
        assert_eq!(prefs.fetch_long("Long")?, 100);
        assert_eq!(prefs.fetch_float("Float")?, 1000.1);
        assert_eq!(prefs.fetch_integer("Integer")?, 10);
        assert!(prefs.fetch_boolean("isDataSaved")?);
        Ok(())
    }

    #[test]
    fn test_new_kind_replaces_old() -> Result<()> {
        let prefs = prefs();
        assert!(prefs.save_integer("k", 1));
        assert!(prefs.save_string("k", "now a string"));
        assert_eq!(prefs.fetch_string("k")?.as_deref(), Some("now a string"));
        Ok(())
    }

    #[test]
    fn test_kind_mismatch() {
        let prefs = prefs();
        assert!(prefs.save_long("n", 5));
        let err = prefs.fetch_integer("n");
        assert!(matches!(
            err,
            Err(Error::KindMismatch {
                expected: ValueKind::Int,
                found: ValueKind::Long,
                ..
            })
        ));
    }

    #[test]
    fn test_object_round_trip() -> Result<()> {
        let prefs = prefs();
        let obj = CustomObject {
            name: "object name".to_string(),
            age: "99".to_string(),
        };
        assert!(prefs.save_object("Object", &obj)?);
        assert_eq!(prefs.fetch_object::<CustomObject>("Object")?, Some(obj));
        Ok(())
    }

    #[test]
    fn test_unencodable_object() {
        let prefs = prefs();
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys have no JSON form");

        let err = prefs.save_object("bad", &map);
        assert!(matches!(err, Err(Error::UnsupportedValueKind { .. })));
        assert!(!prefs.backend().contains("bad").unwrap_or(true));
    }

    #[test]
    fn test_runtime_missing_serializer() {
        let prefs = Preferences::new(
            MemoryBackend::new(),
            "ns",
            AccessMode::Private,
            None::<JsonSerializer>,
        );
        assert!(matches!(
            prefs.save_object("k", &1),
            Err(Error::CapabilityNotConfigured)
        ));
        assert!(matches!(
            prefs.fetch_object::<i32>("k"),
            Err(Error::CapabilityNotConfigured)
        ));
    }

    #[test]
    fn test_remove_data_and_contains() -> Result<()> {
        let prefs = prefs();
        assert!(prefs.save_boolean("isDataSaved", true));
        assert!(prefs.contains("isDataSaved")?);
        assert!(prefs.remove_data("isDataSaved"));
        assert!(!prefs.contains("isDataSaved")?);
        Ok(())
    }

    #[test]
    fn test_remove_all_settles() -> Result<()> {
        let provider = MemoryProvider::new();
        let backend = crate::store::BackendProvider::open(&provider, "ns", AccessMode::Private)?;
        let prefs = Preferences::new(backend, "ns", AccessMode::Private, NoSerializer);
        assert!(prefs.save_integer("a", 1));
        assert!(prefs.save_string("b", "x"));

        prefs.remove_all().wait()?;
        assert!(!prefs.contains("a")?);
        assert!(!prefs.contains("b")?);
        assert!(prefs.keys()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_after_remove_all_is_kept() -> Result<()> {
        let prefs = prefs();
        for i in 0..200 {
            let handle = prefs.remove_all();
            assert!(prefs.save_integer("k", i));
            handle.wait()?;
            assert_eq!(prefs.fetch_integer("k")?, i);
        }
        Ok(())
    }

    #[test]
    fn test_refused_commit_is_false() -> Result<()> {
        let prefs = prefs();
        prefs.backend().set_read_only(true);
        assert!(!prefs.save_string("k", "v"));
        assert!(!prefs.remove_data("k"));
        assert!(!prefs.save_object("o", &1)?);
        assert!(prefs.remove_all().wait().is_err());
        Ok(())
    }
}
