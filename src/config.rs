//! File configuration and resolved run settings.
//!
//! Defaults can live in `$XDG_CONFIG_HOME/ikfetch/config.toml` (or
//! `$HOME/.config/ikfetch/config.toml`). Command-line values always win; the
//! binary merges both into a [`FetchSettings`] that the rest of the library
//! consumes.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::api::{DocLimits, RetryPolicy};
use crate::query::QueryOptions;
use crate::search::{MAX_PAGES_PER_CALL, SearchOptions};

/// Directory name under the config home.
const APP_DIR: &str = "ikfetch";

/// Config file name.
const CONFIG_FILE: &str = "config.toml";

/// Log level labels accepted by `--loglevel` and `log_level`.
pub const LOG_LEVELS: [&str; 5] = ["error", "warning", "info", "debug", "trace"];

/// Upper bound accepted for `workers`.
const MAX_WORKERS: usize = 64;

/// Errors raised while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A key is present with an unusable value.
    #[error("invalid config value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// TOML-backed defaults for the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// API token sent as `Authorization: Token <token>`.
    pub token: Option<String>,
    /// Root directory for downloaded documents.
    pub data_dir: Option<PathBuf>,
    /// Worker count for query files.
    pub workers: Option<usize>,
    /// Pages requested per search call.
    pub max_pages: Option<u32>,
    /// Default log level label.
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an out-of-range or empty value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(workers) = self.workers
            && !(1..=MAX_WORKERS).contains(&workers)
        {
            return Err(ConfigError::Invalid {
                key: "workers",
                message: format!("{workers}, expected 1..={MAX_WORKERS}"),
            });
        }
        if let Some(max_pages) = self.max_pages
            && !(1..=MAX_PAGES_PER_CALL).contains(&max_pages)
        {
            return Err(ConfigError::Invalid {
                key: "max_pages",
                message: format!("{max_pages}, expected 1..={MAX_PAGES_PER_CALL}"),
            });
        }
        if let Some(level) = self.log_level.as_deref()
            && !LOG_LEVELS.contains(&level)
        {
            return Err(ConfigError::Invalid {
                key: "log_level",
                message: format!("'{level}', expected one of {}", LOG_LEVELS.join(", ")),
            });
        }
        if let Some(token) = self.token.as_deref()
            && token.trim().is_empty()
        {
            return Err(ConfigError::Invalid {
                key: "token",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/ikfetch/config.toml`
/// 2. `$HOME/.config/ikfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(CONFIG_FILE));
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config from the default path when the file exists.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but cannot be read, parsed
/// or validated.
pub fn load_default_file_config() -> Result<Option<FileConfig>, ConfigError> {
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_file_config(&path).map(Some),
        _ => Ok(None),
    }
}

/// Loads and validates the config file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be read, parsed or validated.
pub fn load_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: FileConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// API token.
    pub token: String,
    /// Root directory for downloaded documents.
    pub data_dir: PathBuf,
    /// Date, sort and added-today filters applied to every query.
    pub query_options: QueryOptions,
    /// Search traversal switches.
    pub search: SearchOptions,
    /// Citation limits for detail requests.
    pub limits: DocLimits,
    /// Fetch original court copies when available.
    pub want_original: bool,
    /// Worker count for query files.
    pub workers: usize,
    /// Follow links from the seed document during citation expansion.
    pub follow_links: bool,
    /// Retry policy of the call layer.
    pub retry: RetryPolicy,
}

impl FetchSettings {
    /// Creates settings with defaults for everything except token and data directory.
    #[must_use]
    pub fn new(token: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            token: token.into(),
            data_dir: data_dir.into(),
            query_options: QueryOptions::default(),
            search: SearchOptions::default(),
            limits: DocLimits::default(),
            want_original: false,
            workers: 5,
            follow_links: false,
            retry: RetryPolicy::default(),
        }
    }
}
