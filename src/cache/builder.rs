//! Builder for ResourceCache
//!
//! This module contains [`ResourceCacheBuilder`] which provides a fluent API
//! for creating a [`ResourceCache`](super::ResourceCache).

use crate::config::CacheConfig;
use crate::error::Result;
use crate::events::{CacheEvent, EventCallback};
use crate::loader::{ImmediateLoader, ResourceLoader};
use std::sync::Arc;

use super::ResourceCache;

/// Builder for creating a [`ResourceCache`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use thumbcache::{LoadTicket, ResourceCache};
///
/// let cache = ResourceCache::builder()
///     .page_size(12)
///     .prefetch_count(3)
///     .with_loader(|ticket: LoadTicket| {
///         // hand the locator to the image pipeline, finish the ticket later
///         ticket.mark_ready();
///     })
///     .on_event(|event| println!("{event:?}"))
///     .build_shared()
///     .unwrap();
///
/// assert_eq!(cache.capacity(), 15);
/// ```
pub struct ResourceCacheBuilder {
    config: CacheConfig,
    loader: Option<Arc<dyn ResourceLoader>>,
    listeners: Vec<EventCallback>,
}

impl Default for ResourceCacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCacheBuilder {
    /// Create a new builder with the default sizing
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
            loader: None,
            listeners: Vec::new(),
        }
    }

    /// Replace the whole sizing configuration
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of items visible per page
    pub fn page_size(mut self, items: usize) -> Self {
        self.config.page_size = items;
        self
    }

    /// Set the full-screen lookahead count
    pub fn prefetch_count(mut self, items: usize) -> Self {
        self.config.prefetch_count = items;
        self
    }

    /// Set the loader that starts fetching new resources.
    ///
    /// Defaults to [`ImmediateLoader`].
    pub fn with_loader<L>(mut self, loader: L) -> Self
    where
        L: ResourceLoader + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Use a loader already shared with other components
    pub fn with_shared_loader(mut self, loader: Arc<dyn ResourceLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Register an event listener before the cache is used
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(callback));
        self
    }

    /// Build the [`ResourceCache`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured capacity is 0 or above
    /// [`MAX_CAPACITY`](crate::config::MAX_CAPACITY).
    pub fn build(self) -> Result<ResourceCache> {
        let loader = self.loader.unwrap_or_else(|| Arc::new(ImmediateLoader));
        let cache = ResourceCache::new(self.config, loader)?;

        for listener in self.listeners {
            cache.events().add(listener);
        }

        Ok(cache)
    }

    /// Build the cache wrapped in an `Arc`, ready to hand to views
    ///
    /// # Errors
    ///
    /// Returns an error if the configured capacity is 0 or above
    /// [`MAX_CAPACITY`](crate::config::MAX_CAPACITY).
    pub fn build_shared(self) -> Result<Arc<ResourceCache>> {
        self.build().map(Arc::new)
    }
}
