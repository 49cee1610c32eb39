//! Loader configuration file
//!
//! ```json
//! {
//!   "search_paths": ["schemas", "/usr/share/schemas"],
//!   "include_all": false,
//!   "log_level": "INFO",
//!   "preload": ["Common.json"]
//! }
//! ```
//!
//! Every field is optional. Relative paths are taken relative to the
//! directory holding the configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};
use crate::schema::LoadOptions;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Unreadable(String, String),

    #[error("Invalid config JSON: {0}")]
    Malformed(String),

    #[error("Unknown log_level '{0}'")]
    UnknownLogLevel(String),

    #[error("Search path {0} is not a directory")]
    MissingSearchPath(String),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Unreadable(..) => "CONFIG_UNREADABLE",
            ConfigError::Malformed(_) => "CONFIG_MALFORMED",
            ConfigError::UnknownLogLevel(_) => "CONFIG_UNKNOWN_LOG_LEVEL",
            ConfigError::MissingSearchPath(_) => "CONFIG_MISSING_SEARCH_PATH",
        }
    }
}

/// Loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directories searched for schema files and includes, in order
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Load includes transitively (default: false)
    #[serde(default)]
    pub include_all: bool,

    /// Minimum log severity (default: "INFO")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Schemas loaded, as their own unit, before a command's sources
    #[serde(default)]
    pub preload: Vec<PathBuf>,
}

fn default_log_level() -> String {
    Severity::Info.as_str().to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            include_all: false,
            log_level: default_log_level(),
            preload: Vec::new(),
        }
    }
}

impl LoaderConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(path.display().to_string(), e.to_string()))?;
        let config = Self::from_json(&content, path.parent())?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("search_paths", &config.search_paths.len().to_string()),
            ],
        );
        Ok(config)
    }

    /// Parses and validates configuration text. Relative paths are joined
    /// onto `base_dir` when given.
    pub fn from_json(content: &str, base_dir: Option<&Path>) -> ConfigResult<Self> {
        let mut config: LoaderConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        if let Some(base) = base_dir.filter(|b| !b.as_os_str().is_empty()) {
            config.search_paths = config.search_paths.iter().map(|p| rebase(base, p)).collect();
            config.preload = config.preload.iter().map(|p| rebase(base, p)).collect();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        self.severity()?;

        if let Some(missing) = self.search_paths.iter().find(|p| !p.is_dir()) {
            return Err(ConfigError::MissingSearchPath(missing.display().to_string()));
        }

        Ok(())
    }

    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::UnknownLogLevel(self.log_level.clone()))
    }

    pub fn to_options(&self) -> LoadOptions {
        LoadOptions {
            search_paths: self.search_paths.clone(),
            include_all: self.include_all,
        }
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
