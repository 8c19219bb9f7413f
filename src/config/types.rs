//! Core configuration types for thumbcache

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::EnvSource;
use crate::error::{Error, Result};

/// Thumbnails visible on one gallery page
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Items kept ahead of the cursor for full-screen browsing
pub const DEFAULT_PREFETCH_COUNT: usize = 3;

/// Largest capacity a cache may be configured with
///
/// The entry table is allocated up front, so sizes far beyond a few pages of
/// decoded images are rejected instead of exhausting memory.
pub const MAX_CAPACITY: usize = 4096;

/// Sizing for the resource cache
///
/// The capacity is never configured directly. It is one full page of
/// thumbnails plus the few items ahead that a full-screen preview needs for
/// instant transitions, so both terms are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of items visible per gallery page
    pub page_size: usize,

    /// Lookahead count for full-screen browsing
    pub prefetch_count: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_count: DEFAULT_PREFETCH_COUNT,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for `CacheConfig`
    ///
    /// # Example
    /// ```rust
    /// use thumbcache::CacheConfig;
    ///
    /// let config = CacheConfig::builder()
    ///     .page_size(24)
    ///     .prefetch_count(4)
    ///     .build();
    ///
    /// assert_eq!(config.capacity(), 28);
    /// ```
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Maximum number of entries the cache may hold
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.page_size.saturating_add(self.prefetch_count)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting capacity is 0 or above [`MAX_CAPACITY`]
    pub fn validate(&self) -> Result<()> {
        let capacity = self.capacity();
        if capacity == 0 {
            return Err(Error::InvalidCapacity(
                "page size plus prefetch count must be greater than 0".into(),
            ));
        }
        if capacity > MAX_CAPACITY {
            return Err(Error::InvalidCapacity(format!(
                "page size plus prefetch count is {capacity}, the maximum is {MAX_CAPACITY}"
            )));
        }
        Ok(())
    }

    /// Load configuration overrides from the environment
    ///
    /// Reads `{PREFIX}_PAGE_SIZE` and `{PREFIX}_PREFETCH_COUNT` (prefix is
    /// uppercased). Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but is not a non-negative integer,
    /// or if the resulting configuration is invalid.
    pub fn from_env(prefix: &str, source: &dyn EnvSource) -> Result<Self> {
        let mut config = Self::default();
        let prefix = prefix.to_uppercase();

        let page_key = format!("{prefix}_PAGE_SIZE");
        if let Ok(value) = source.var(&page_key) {
            config.page_size = parse_count(&page_key, &value)?;
        }

        let prefetch_key = format!("{prefix}_PREFETCH_COUNT");
        if let Ok(value) = source.var(&prefetch_key) {
            config.prefetch_count = parse_count(&prefetch_key, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    ///
    /// The format is chosen by extension: `.json` always, `.toml` with the
    /// `toml` feature. Missing keys keep their defaults.
    ///
    /// ```json
    /// { "page_size": 8, "prefetch_count": 3 }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, has an unknown
    /// extension, or describes an invalid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config: Self = match extension.as_str() {
            "json" => {
                let content = read_config(path)?;
                serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            #[cfg(feature = "toml")]
            "toml" => {
                let content = read_config(path)?;
                toml::from_str(&content).map_err(|e| Error::ConfigParse {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            other => return Err(Error::UnsupportedFormat(other.to_string())),
        };

        config.validate()?;
        log::debug!(
            "Loaded cache config from {}: capacity {}",
            path.display(),
            config.capacity()
        );
        Ok(config)
    }

    /// Default location of the cache config file for an application
    ///
    /// - Linux: `~/.config/{app}/cache.json`
    /// - macOS: `~/Library/Application Support/{app}/cache.json`
    /// - Windows: `%APPDATA%\{app}\cache.json`
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(app_name).join("cache.json"))
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| Error::InvalidConfigValue {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Builder for creating `CacheConfig` with a fluent API
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    page_size: usize,
    prefetch_count: usize,
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheConfigBuilder {
    /// Create a new builder starting from the defaults
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_count: DEFAULT_PREFETCH_COUNT,
        }
    }

    /// Set the number of items visible per page
    pub fn page_size(mut self, items: usize) -> Self {
        self.page_size = items;
        self
    }

    /// Set the full-screen lookahead count
    pub fn prefetch_count(mut self, items: usize) -> Self {
        self.prefetch_count = items;
        self
    }

    /// Build the `CacheConfig`
    ///
    /// Validation happens when the cache is built.
    pub fn build(self) -> CacheConfig {
        CacheConfig {
            page_size: self.page_size,
            prefetch_count: self.prefetch_count,
        }
    }
}
