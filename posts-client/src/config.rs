//! Settings loading for postsync.
//!
//! Settings are loaded from a TOML file (default: `posts.toml`). Every
//! section and field is optional.

use postsync_core::OpenPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file name.
pub const SETTINGS_FILE: &str = "posts.toml";

/// Root settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Connection open policy.
    #[serde(default)]
    pub open: OpenSettings,
    /// Post defaults.
    #[serde(default)]
    pub posts: PostsSettings,
}

/// Connection open settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenSettings {
    /// Per-attempt timeout in seconds (default: 15).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a failed or timed out open (default: 1).
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Base delay before a retry in milliseconds (default: 500).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Post settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PostsSettings {
    /// Name given to posts created with a blank name.
    pub default_name: Option<String>,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for OpenSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load settings from `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Open policy described by the `[open]` section.
    pub fn open_policy(&self) -> OpenPolicy {
        OpenPolicy::new()
            .with_timeout(Duration::from_secs(self.open.timeout_secs))
            .with_retries(self.open.retries)
            .with_retry_delay(Duration::from_millis(self.open.retry_delay_ms))
    }

    /// Configured default post name, ignoring blank values.
    pub fn default_name(&self) -> Option<&str> {
        self.posts
            .default_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// Settings error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read settings file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse settings file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
