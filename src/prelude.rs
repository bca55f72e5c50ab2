//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use typed_prefs::prelude::*;
//!
//! let prefs = PreferencesBuilder::new(MemoryProvider::new()).build()?;
//! prefs.save_boolean("onboarded", true);
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Facade
pub use crate::prefs::{
    BulkWrite, FLOAT_ABSENT, INT_ABSENT, JsonSerializer, LONG_ABSENT, NoSerializer, Preferences,
    PreferencesBuilder, Serializer, Value,
};

// Backends
pub use crate::store::{AccessMode, Backend, BackendProvider, ClearHandle, MemoryProvider};
#[cfg(feature = "fjall")]
pub use crate::store::FjallProvider;
