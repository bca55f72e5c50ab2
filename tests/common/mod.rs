//! Shared fixtures for the integration tests.

#![cfg(feature = "fjall")]
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use typed_prefs::{FjallBackend, FjallProvider, JsonSerializer, Preferences, PreferencesBuilder};

/// Namespace used by fixtures that don't care about the name.
pub const NAMESPACE: &str = "in.example.settings";

/// A record of two string fields, the shape object storage is exercised with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: String,
}

impl Profile {
    pub fn sample() -> Self {
        Self {
            name: "object name".to_string(),
            age: "99".to_string(),
        }
    }
}

/// A fjall-backed store in a temporary directory.
///
/// The directory lives as long as the fixture, so handles can be dropped and
/// reopened against the same data.
pub struct TestStore {
    pub dir: TempDir,
}

impl TestStore {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn provider(&self) -> FjallProvider {
        FjallProvider::new(self.dir.path())
    }

    /// Open [`NAMESPACE`] with object storage enabled.
    pub fn open(&self) -> anyhow::Result<Preferences<FjallBackend, JsonSerializer>> {
        Ok(PreferencesBuilder::new(self.provider())
            .having_namespace(NAMESPACE)
            .with_object_storage_support()
            .build()?)
    }

    /// Open [`NAMESPACE`] without object storage.
    pub fn open_plain(&self) -> anyhow::Result<Preferences<FjallBackend>> {
        Ok(PreferencesBuilder::new(self.provider())
            .having_namespace(NAMESPACE)
            .build()?)
    }
}
