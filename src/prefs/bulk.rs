//! Atomic bulk writes.
//!
//! [`BulkWrite`] names the kind of every entry up front, so a mapping can
//! never mix kinds. [`BulkWrite::infer`] builds one from dynamically typed
//! [`Value`]s, picking the kind from the first entry and checking every other
//! entry against it.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::logging::{debug, error};
use crate::store::{Backend, Batch, StoredValue};

use super::Preferences;
use super::serializer::ObjectSupport;

/// A homogeneous mapping to be committed as one batch.
///
/// `T` is the value type of the [`Serializable`](Self::Serializable) variant;
/// the other variants ignore it.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkWrite<T = serde_json::Value> {
    Long(BTreeMap<String, i64>),
    String(BTreeMap<String, String>),
    Int(BTreeMap<String, i32>),
    Bool(BTreeMap<String, bool>),
    Float(BTreeMap<String, f32>),
    StringSet(BTreeMap<String, BTreeSet<String>>),
    /// Values stored as their serializer text.
    Serializable(BTreeMap<String, T>),
}

/// A dynamically typed value for [`BulkWrite::infer`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Long(i64),
    String(String),
    Int(i32),
    Bool(bool),
    Float(f32),
    Set(Vec<Value>),
    /// A structured value, stored through the serializer.
    Object(serde_json::Value),
    /// No value at all. Never storable.
    Null,
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Long(_) => "long",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
            Self::Set(_) => "set",
            Self::Object(_) => "object",
            Self::Null => "null",
        }
    }
}

impl<T> BulkWrite<T> {
    pub fn len(&self) -> usize {
        match self {
            Self::Long(m) => m.len(),
            Self::String(m) => m.len(),
            Self::Int(m) => m.len(),
            Self::Bool(m) => m.len(),
            Self::Float(m) => m.len(),
            Self::StringSet(m) => m.len(),
            Self::Serializable(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the kind every entry is written as.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Long(_) => "long",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
            Self::StringSet(_) => "string-set",
            Self::Serializable(_) => "object",
        }
    }
}

impl BulkWrite<serde_json::Value> {
    /// Pick a variant from the first entry and convert every entry to it.
    ///
    /// The first entry's kind decides, in this order: long, string, int,
    /// bool, float, set (only sets of strings; an empty set counts as one),
    /// object. [`Value::Null`] is never storable. Any later entry of another
    /// kind fails with [`Error::MixedValueKinds`].
    pub fn infer(entries: BTreeMap<String, Value>) -> Result<Self> {
        let Some((first_key, first)) = entries.iter().next() else {
            return Err(Error::EmptyBatch);
        };

        match first {
            Value::Long(_) => convert(entries, Self::Long, |v| match v {
                Value::Long(n) => Ok(n),
                other => Err(other),
            }),
            Value::String(_) => convert(entries, Self::String, |v| match v {
                Value::String(s) => Ok(s),
                other => Err(other),
            }),
            Value::Int(_) => convert(entries, Self::Int, |v| match v {
                Value::Int(n) => Ok(n),
                other => Err(other),
            }),
            Value::Bool(_) => convert(entries, Self::Bool, |v| match v {
                Value::Bool(b) => Ok(b),
                other => Err(other),
            }),
            Value::Float(_) => convert(entries, Self::Float, |v| match v {
                Value::Float(f) => Ok(f),
                other => Err(other),
            }),
            Value::Set(_) => {
                let mut sets = BTreeMap::new();
                for (key, value) in entries {
                    let items = match value {
                        Value::Set(items) => items,
                        other => return Err(mixed(key, "set", &other)),
                    };
                    let set = string_set(&key, items)?;
                    sets.insert(key, set);
                }
                Ok(Self::StringSet(sets))
            }
            Value::Object(_) => convert(entries, Self::Serializable, |v| match v {
                Value::Object(o) => Ok(o),
                other => Err(other),
            }),
            Value::Null => Err(Error::unsupported(
                first_key.clone(),
                "value kind not storable",
            )),
        }
    }
}

/// Convert every entry with `extract`, which hands back values of the wrong kind.
fn convert<V, W>(
    entries: BTreeMap<String, Value>,
    wrap: impl FnOnce(BTreeMap<String, V>) -> W,
    extract: impl Fn(Value) -> std::result::Result<V, Value>,
) -> Result<W> {
    let mut expected = None;
    let mut out = BTreeMap::new();
    for (key, value) in entries {
        let kind = *expected.get_or_insert(value.kind_name());
        match extract(value) {
            Ok(v) => {
                out.insert(key, v);
            }
            Err(other) => return Err(mixed(key, kind, &other)),
        }
    }
    Ok(wrap(out))
}

fn string_set(key: &str, items: Vec<Value>) -> Result<BTreeSet<String>> {
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(Error::unsupported(key, "only sets of strings are storable")),
        })
        .collect()
}

fn mixed(key: String, expected: &'static str, found: &Value) -> Error {
    Error::MixedValueKinds {
        key,
        expected,
        found: found.kind_name(),
    }
}

impl<B: Backend, S: ObjectSupport> Preferences<B, S> {
    /// Write every entry of `write` in one atomic batch.
    ///
    /// Returns whether the commit succeeded; nothing is partially written.
    /// An empty mapping fails with [`Error::EmptyBatch`]. For
    /// [`BulkWrite::Serializable`], every value is encoded before the batch
    /// is opened, so an unencodable value fails with
    /// [`Error::UnsupportedValueKind`] and leaves the store untouched; on a
    /// handle without a serializer it fails with
    /// [`Error::CapabilityNotConfigured`].
    pub fn put_all<T: Serialize>(&self, write: BulkWrite<T>) -> Result<bool> {
        if write.is_empty() {
            return Err(Error::EmptyBatch);
        }
        debug!(
            namespace = %self.namespace,
            kind = write.kind_name(),
            entries = write.len(),
            "bulk write"
        );

        let batch = match write {
            BulkWrite::Long(m) => stage(m, StoredValue::Long),
            BulkWrite::String(m) => stage(m, StoredValue::String),
            BulkWrite::Int(m) => stage(m, StoredValue::Int),
            BulkWrite::Bool(m) => stage(m, StoredValue::Bool),
            BulkWrite::Float(m) => stage(m, StoredValue::Float),
            BulkWrite::StringSet(m) => stage(m, StoredValue::StringSet),
            BulkWrite::Serializable(m) => {
                let mut encoded = BTreeMap::new();
                for (key, value) in m {
                    let text = self.serializer.encode_object(&value).map_err(|e| match e {
                        Error::Json(e) => {
                            error!(key = %key, error = %e, "value has no serialized form");
                            Error::unsupported(key.as_str(), e.to_string())
                        }
                        other => other,
                    })?;
                    encoded.insert(key, text);
                }
                stage(encoded, StoredValue::String)
            }
        };

        Ok(self.commit(batch))
    }
}

fn stage<V>(entries: BTreeMap<String, V>, wrap: impl Fn(V) -> StoredValue) -> Batch {
    let mut batch = Batch::new();
    for (key, value) in entries {
        batch.put(key, wrap(value));
    }
    batch
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;
    use crate::prefs::{JsonSerializer, NoSerializer};
    use crate::store::{AccessMode, MemoryBackend};

    fn entries(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn prefs() -> Preferences<MemoryBackend, JsonSerializer> {
        Preferences::new(MemoryBackend::new(), "bulk", AccessMode::Private, JsonSerializer)
    }

    #[test]
    fn test_infer_follows_first_entry() -> Result<()> {
        let write = BulkWrite::infer(entries(vec![
            ("a", Value::Long(1)),
            ("b", Value::Long(2)),
        ]))?;
        assert_eq!(write.kind_name(), "long");
        assert_eq!(write.len(), 2);

        let write = BulkWrite::infer(entries(vec![("flag", Value::Bool(true))]))?;
        assert!(matches!(write, BulkWrite::Bool(_)));
        Ok(())
    }

    #[test]
    fn test_infer_rejects_mixed_kinds() {
        let err = BulkWrite::infer(entries(vec![
            ("a", Value::Int(1)),
            ("b", Value::Long(2)),
        ]));
        assert!(matches!(
            err,
            Err(Error::MixedValueKinds {
                expected: "int",
                found: "long",
                ..
            })
        ));
    }

    #[test]
    fn test_infer_string_sets() -> Result<()> {
        let write = BulkWrite::infer(entries(vec![(
            "a",
            Value::Set(vec![Value::String("x".into()), Value::String("y".into())]),
        )]))?;
        let BulkWrite::StringSet(sets) = write else {
            return Err(Error::EmptyBatch);
        };
        let expected: BTreeSet<String> = ["x", "y"].into_iter().map(String::from).collect();
        assert_eq!(sets.get("a"), Some(&expected));
        Ok(())
    }

    #[test]
    fn test_infer_empty_set_is_string_set() -> Result<()> {
        let write = BulkWrite::infer(entries(vec![("a", Value::Set(Vec::new()))]))?;
        assert!(matches!(write, BulkWrite::StringSet(_)));
        Ok(())
    }

    #[test]
    fn test_infer_rejects_non_string_set() {
        let err = BulkWrite::infer(entries(vec![(
            "a",
            Value::Set(vec![Value::Int(1), Value::Int(2)]),
        )]));
        assert!(matches!(err, Err(Error::UnsupportedValueKind { .. })));
    }

    #[test]
    fn test_infer_rejects_null_and_empty() {
        assert!(matches!(
            BulkWrite::infer(entries(vec![("a", Value::Null)])),
            Err(Error::UnsupportedValueKind { .. })
        ));
        assert!(matches!(
            BulkWrite::infer(BTreeMap::new()),
            Err(Error::EmptyBatch)
        ));
    }

    #[test]
    fn test_put_all_objects() -> Result<()> {
        let prefs = prefs();
        let write = BulkWrite::infer(entries(vec![
            ("p1", Value::Object(json!({"name": "a", "age": "1"}))),
            ("p2", Value::Object(json!({"name": "b", "age": "2"}))),
        ]))?;
        assert!(prefs.put_all(write)?);

        let p2: Option<serde_json::Value> = prefs.fetch_object("p2")?;
        assert_eq!(p2, Some(json!({"name": "b", "age": "2"})));
        Ok(())
    }

    #[test]
    fn test_put_all_without_serializer() -> Result<()> {
        let prefs = Preferences::new(MemoryBackend::new(), "bulk", AccessMode::Private, NoSerializer);

        let mut longs = BTreeMap::new();
        longs.insert("a".to_string(), 1_i64);
        assert!(prefs.put_all(BulkWrite::<()>::Long(longs))?);
        assert_eq!(prefs.fetch_long("a")?, 1);

        let mut objects = BTreeMap::new();
        objects.insert("o".to_string(), json!({"k": "v"}));
        assert!(matches!(
            prefs.put_all(BulkWrite::Serializable(objects)),
            Err(Error::CapabilityNotConfigured)
        ));
        assert!(!prefs.contains("o")?);
        Ok(())
    }

    /// Map key that only has a JSON form when it is a name.
    #[derive(Debug, PartialEq, Eq, Hash, Serialize)]
    #[serde(untagged)]
    enum Key {
        Name(String),
        Pair(i32, i32),
    }

    #[test]
    fn test_put_all_unencodable_leaves_store_untouched() -> Result<()> {
        let prefs = prefs();
        let good: HashMap<Key, i32> = [(Key::Name("k".to_string()), 1)].into_iter().collect();
        let bad: HashMap<Key, i32> = [(Key::Pair(1, 2), 1)].into_iter().collect();

        let mut objects = BTreeMap::new();
        objects.insert("a_good".to_string(), good);
        objects.insert("b_bad".to_string(), bad);

        assert!(matches!(
            prefs.put_all(BulkWrite::Serializable(objects)),
            Err(Error::UnsupportedValueKind { .. })
        ));
        assert!(prefs.keys()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_put_all_refused_commit() -> Result<()> {
        let prefs = prefs();
        prefs.backend().set_read_only(true);

        let mut flags = BTreeMap::new();
        flags.insert("a".to_string(), true);
        assert!(!prefs.put_all(BulkWrite::<()>::Bool(flags))?);
        Ok(())
    }

    #[test]
    fn test_put_all_empty() {
        let prefs = prefs();
        assert!(matches!(
            prefs.put_all(BulkWrite::<()>::Int(BTreeMap::new())),
            Err(Error::EmptyBatch)
        ));
    }
}
