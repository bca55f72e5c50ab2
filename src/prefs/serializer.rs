//! The serializer capability for object storage.
//!
//! Whether a [`Preferences`](super::Preferences) handle can store objects is
//! part of its type. A handle built with [`NoSerializer`] has no
//! `save_object`/`fetch_object` methods at all. A handle whose serializer is
//! an `Option<S>` decides at runtime and reports
//! [`Error::CapabilityNotConfigured`] when it is `None`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Converts structured values to and from text.
pub trait Serializer: Send + Sync {
    /// Whether this serializer can actually encode and decode.
    fn is_configured(&self) -> bool {
        true
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T>;
}

/// JSON encoding via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        Ok(serde_json::from_str(text)?)
    }
}

impl<S: Serializer> Serializer for Option<S> {
    fn is_configured(&self) -> bool {
        self.is_some()
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        self.as_ref()
            .ok_or(Error::CapabilityNotConfigured)?
            .encode(value)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        self.as_ref()
            .ok_or(Error::CapabilityNotConfigured)?
            .decode(text)
    }
}

/// Marker for handles built without object storage support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSerializer;

/// Encoding as seen by the bulk dispatcher.
///
/// Every handle can run `put_all`, but only handles with a serializer can
/// write the `Serializable` variant; [`NoSerializer`] refuses it.
pub trait ObjectSupport {
    fn encode_object<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;
}

impl ObjectSupport for NoSerializer {
    fn encode_object<T: Serialize + ?Sized>(&self, _value: &T) -> Result<String> {
        Err(Error::CapabilityNotConfigured)
    }
}

impl<S: Serializer> ObjectSupport for S {
    fn encode_object<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        self.encode(value)
    }
}
