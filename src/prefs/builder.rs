//! Builder for [`Preferences`] handles.

use crate::error::Result;
use crate::logging::debug;
use crate::store::{AccessMode, BackendProvider};

use super::Preferences;
use super::serializer::{JsonSerializer, NoSerializer, Serializer};

/// Namespace used when none is given.
pub const DEFAULT_NAMESPACE: &str = "DEFAULT_SIMPLE_PREFERENCE";

/// Configures and opens a [`Preferences`] handle.
///
/// Defaults: namespace [`DEFAULT_NAMESPACE`], [`AccessMode::Private`], no
/// object storage. The serializer choice changes the handle's type, so
/// object methods only exist on handles built with one.
///
/// ```ignore
/// let prefs = PreferencesBuilder::new(MemoryProvider::new())
///     .having_namespace("settings")
///     .using_access_mode(AccessMode::Shared)
///     .with_object_storage_support()
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PreferencesBuilder<P, S = NoSerializer> {
    provider: P,
    namespace: String,
    mode: AccessMode,
    serializer: S,
}

impl<P: BackendProvider> PreferencesBuilder<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            namespace: DEFAULT_NAMESPACE.to_string(),
            mode: AccessMode::default(),
            serializer: NoSerializer,
        }
    }
}

impl<P: BackendProvider, S> PreferencesBuilder<P, S> {
    /// Open the namespace `namespace` instead of the default.
    pub fn having_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn using_access_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable object storage with JSON encoding.
    pub fn with_object_storage_support(self) -> PreferencesBuilder<P, JsonSerializer> {
        self.with_serializer(JsonSerializer)
    }

    /// Enable object storage with a custom serializer.
    pub fn with_serializer<S2: Serializer>(self, serializer: S2) -> PreferencesBuilder<P, S2> {
        PreferencesBuilder {
            provider: self.provider,
            namespace: self.namespace,
            mode: self.mode,
            serializer,
        }
    }

    /// Decide object storage at runtime.
    ///
    /// The handle always has object methods; with `enabled == false` they fail
    /// with [`Error::CapabilityNotConfigured`](crate::Error::CapabilityNotConfigured).
    pub fn with_optional_object_support(
        self,
        enabled: bool,
    ) -> PreferencesBuilder<P, Option<JsonSerializer>> {
        self.with_serializer(enabled.then_some(JsonSerializer))
    }

    /// Open the backend and return the handle.
    pub fn build(self) -> Result<Preferences<P::Backend, S>> {
        debug!(namespace = %self.namespace, mode = ?self.mode, "building preferences");
        let backend = self.provider.open(&self.namespace, self.mode)?;
        Ok(Preferences::new(
            backend,
            self.namespace,
            self.mode,
            self.serializer,
        ))
    }
}
