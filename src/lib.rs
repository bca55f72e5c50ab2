//! Typed preference storage.
//!
//! typed-prefs wraps a key-value store with typed accessors for strings,
//! 32/64-bit integers, floats, booleans and string sets, optional JSON object
//! storage, and atomic bulk writes.
//!
//! # Quick Start
//!
//! ```ignore
//! use typed_prefs::prelude::*;
//!
//! let prefs = PreferencesBuilder::new(FjallProvider::new(".typed-prefs"))
//!     .having_namespace("settings")
//!     .with_object_storage_support()
//!     .build()?;
//!
//! prefs.save_string("user", "ada");
//! prefs.save_object("profile", &Profile { name: "Ada".into(), age: "36".into() })?;
//!
//! let mut scores = BTreeMap::new();
//! scores.insert("level-1".to_string(), 100_i64);
//! scores.insert("level-2".to_string(), 250_i64);
//! prefs.put_all(BulkWrite::<()>::Long(scores))?;
//! ```
//!
//! # Modules
//!
//! - [`prefs`] - The [`Preferences`] facade, its builder, serializers and bulk writes
//! - [`store`] - Backends: in-memory and fjall-backed (requires `fjall` feature)
//! - [`config`] - TOML configuration (requires `config` feature)
//! - [`error`] - Unified error types
//! - [`prelude`] - Convenient re-exports
//!
//! # Feature Flags
//!
//! - `fjall` - Persistent fjall-backed store (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `config` - Load configuration from TOML
//! - `cli` - Enable the command-line binary
//! - `full` - Enable all features

#[cfg(feature = "config")]
pub mod config;
pub mod error;
mod logging;
pub mod prefs;
pub mod prelude;
pub mod store;
#[cfg(feature = "cli")]
pub mod subscriber;

pub use error::{Error, Result};

pub use prefs::{
    BulkWrite, DEFAULT_NAMESPACE, FLOAT_ABSENT, INT_ABSENT, JsonSerializer, LONG_ABSENT,
    NoSerializer, ObjectSupport, Preferences, PreferencesBuilder, Serializer, Value,
};

pub use store::{
    AccessMode, Backend, BackendProvider, Batch, ClearHandle, MemoryBackend, MemoryProvider,
    StoreError, StoredValue, ValueKind,
};
#[cfg(feature = "fjall")]
pub use store::{FjallBackend, FjallProvider};
