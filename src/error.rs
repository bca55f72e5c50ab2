//! Unified error type for the typed-prefs library.
//!
//! Commit failures are not errors at this level: the save operations report
//! them as `false`. Everything else a caller can run into is a variant of
//! [`Error`].

use thiserror::Error;

#[cfg(feature = "config")]
use crate::config::ConfigError;
use crate::store::{StoreError, ValueKind};

/// Unified error type for all typed-prefs operations.
///
/// ```ignore
/// use typed_prefs::Error;
///
/// match prefs.save_object("user", &user) {
///     Ok(true) => {}
///     Ok(false) => eprintln!("commit refused, try again later"),
///     Err(e) if e.is_unsupported() => eprintln!("cannot store user: {e}"),
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An object operation ran on a handle built without a serializer.
    #[error("Object storage support not enabled for this preference store")]
    CapabilityNotConfigured,

    /// The value cannot be stored.
    #[error("Unsupported value for key '{key}': {reason}")]
    UnsupportedValueKind { key: String, reason: String },

    /// A bulk write mixed values of different kinds.
    #[error("Mixed value kinds in bulk write: key '{key}' is {found}, expected {expected}")]
    MixedValueKinds {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A bulk write had no entries.
    #[error("Bulk write needs at least one entry")]
    EmptyBatch,

    /// The key holds a value of another kind.
    #[error("Key '{key}' holds a {found} value, not {expected}")]
    KindMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Stored text could not be decoded into the requested type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration error.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn unsupported(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedValueKind {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the value kind is outside the storable set.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedValueKind { .. })
    }

    /// Returns `true` if an object operation needed a serializer that is missing.
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, Self::CapabilityNotConfigured)
    }
}
