//! Configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::prefs::DEFAULT_NAMESPACE;
use crate::store::AccessMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where and how preferences are stored.
    pub store: StoreConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Store location and capabilities.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root directory; each namespace is a subdirectory.
    pub path: PathBuf,
    /// Namespace to open.
    pub namespace: String,
    /// Access mode for the namespace directory.
    pub mode: AccessMode,
    /// Whether object storage is enabled.
    pub object_support: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".typed-prefs"),
            namespace: DEFAULT_NAMESPACE.to_string(),
            mode: AccessMode::Private,
            object_support: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"typed_prefs=debug"`.
    pub level: String,
    pub format: LogFormat,
    /// `"stdout"`, `"stderr"`, or a file path to append to.
    pub output: String,
    /// ANSI colors (text format on a terminal only).
    pub color: bool,
    pub timestamps: bool,
    /// Include the event target (module path).
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
            output: "stderr".to_string(),
            color: true,
            timestamps: true,
            target: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() -> Result<(), ConfigError> {
        let toml = r#"
[store]
path = "/var/lib/app/prefs"
namespace = "in.example.settings"
mode = "shared"
object_support = false

[logging]
level = "typed_prefs=debug"
format = "json"
output = "stdout"
"#;
        let config = Config::parse(toml)?;
        assert_eq!(config.store.path, PathBuf::from("/var/lib/app/prefs"));
        assert_eq!(config.store.namespace, "in.example.settings");
        assert_eq!(config.store.mode, AccessMode::Shared);
        assert!(!config.store.object_support);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.output, "stdout");
        assert!(config.logging.timestamps);
        Ok(())
    }

    #[test]
    fn test_empty_config_uses_defaults() -> Result<(), ConfigError> {
        let config = Config::parse("")?;
        assert_eq!(config.store.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.store.mode, AccessMode::Private);
        assert!(config.store.object_support);
        assert_eq!(config.logging.level, "warn");
        Ok(())
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(matches!(
            Config::parse("[store]\nmode = \"world\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/typed-prefs.toml"),
            Err(ConfigError::Io(..))
        ));
    }
}
