//! Settings errors

use std::io;
use thiserror::Error;

/// Failure to load, save or validate a configuration file
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file could not be read or written
    #[error("Cannot access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Cannot write config as TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// The file parsed but holds unusable values
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A configuration that cannot be used as given
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Extension other than `.json` or `.toml`
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl ConfigError {
    /// Shorthand for an invalid setting
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;
