//! Crate-level error types shared across modules.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value was present but could not be used.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// Env var or settings key.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    /// A required value was not provided anywhere.
    #[error("Missing required setting: {key}")]
    Missing {
        /// Env var or settings key.
        key: String,
    },

    /// The settings file could not be read.
    #[error("Failed to read settings file {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`crate::settings::Settings`].
    #[error("Failed to parse settings file {}: {source}", .path.display())]
    Parse {
        /// File that failed.
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
