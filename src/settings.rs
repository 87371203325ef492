//! Settings and Configuration
//!
//! Two layers:
//!
//! - [`Settings`] is the live, per-command snapshot the interpreter reads
//!   before every dispatch. It sits behind a [`SettingsStore`] so it can be
//!   changed while the interpreter runs.
//! - [`AppConfig`] is the startup configuration of the `framedeck` binary,
//!   loaded from an optional TOML file and overridden by command-line flags.
//!
//! ## Config File
//!
//! ```toml
//! directive_prefix = ":"
//! history_file = ".framedeck_history"
//! database = "127.0.0.1:6379"
//! fetch_timeout_secs = 10
//! database_timeout_secs = 30
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

/// Default directive prefix.
pub const DEFAULT_DIRECTIVE_PREFIX: char = ':';

/// Default timeout for remote fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for database transactions.
pub const DEFAULT_DATABASE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid directive prefix {0:?}: expected a single non-whitespace character")]
    InvalidPrefix(String),
}

/// The settings the interpreter consults for every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Character that marks a client directive
    pub directive_prefix: char,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directive_prefix: DEFAULT_DIRECTIVE_PREFIX,
        }
    }
}

/// Source of the current settings.
pub trait SettingsStore: Send + Sync {
    /// Returns the settings in effect right now.
    fn snapshot(&self) -> Settings;
}

/// Settings shared between the interpreter and whoever edits them.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Replaces the directive prefix for subsequent commands.
    pub fn set_directive_prefix(&self, prefix: char) {
        self.inner.write().unwrap().directive_prefix = prefix;
    }
}

impl SettingsStore for SharedSettings {
    fn snapshot(&self) -> Settings {
        *self.inner.read().unwrap()
    }
}

/// Parses a directive prefix from user input.
pub fn parse_prefix(value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_whitespace() => Ok(c),
        _ => Err(ConfigError::InvalidPrefix(value.to_string())),
    }
}

/// Startup configuration of the `framedeck` binary.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub settings: Settings,
    /// Where history is persisted; in memory when `None`
    pub history_file: Option<PathBuf>,
    /// Address of a RESP engine; offline when `None`
    pub database: Option<String>,
    pub fetch_timeout: Duration,
    pub database_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            history_file: None,
            database: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            database_timeout: DEFAULT_DATABASE_TIMEOUT,
        }
    }
}

/// On-disk shape of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    directive_prefix: Option<String>,
    history_file: Option<PathBuf>,
    database: Option<String>,
    fetch_timeout_secs: Option<u64>,
    database_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Loads a config file, filling unset keys with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses config file contents.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let mut config = AppConfig::default();
        if let Some(prefix) = file.directive_prefix {
            config.settings.directive_prefix = parse_prefix(&prefix)?;
        }
        config.history_file = file.history_file;
        config.database = file.database;
        if let Some(secs) = file.fetch_timeout_secs {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.database_timeout_secs {
            config.database_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
