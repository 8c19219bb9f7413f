//! Error types for thumbcache
//!
//! Cache and view operations never fail; missing resources and load failures
//! are reported as state. These errors cover configuration only.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for thumbcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for thumbcache
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Invalid cache capacity: {0}")]
    InvalidCapacity(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidConfigValue { key: String, reason: String },

    #[error("Unsupported config file format: '{0}'")]
    UnsupportedFormat(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to parse config file '{path}': {reason}")]
    ConfigParse { path: PathBuf, reason: String },
}

impl Error {
    /// Check if this error comes from configuration values rather than I/O
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidCapacity(_)
                | Error::InvalidConfigValue { .. }
                | Error::UnsupportedFormat(_)
                | Error::ConfigParse { .. }
        )
    }

    /// Check if this error comes from the filesystem
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::ConfigRead { .. })
    }
}
