//! Bounded resource cache with least-recently-used eviction
//!
//! The cache owns every [`ResourceHandle`] it hands out. Views borrow handles
//! by cloning the reference, but only the cache decides when a resource stops
//! being cached: on eviction of the least recently used entry, or on a full
//! [`clear`](ResourceCache::clear).

mod builder;
mod stats;

pub use builder::ResourceCacheBuilder;
pub use stats::CacheStats;

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::events::{CacheEvent, EventManager};
use crate::loader::ResourceLoader;
use crate::resource::{ResourceAttributes, ResourceHandle};
use crate::sync::MutexExt;
use log::{debug, info};
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Internal cache state
struct CacheState {
    config: CacheConfig,

    /// Entries in recency order (most recently used first)
    entries: LruCache<String, ResourceHandle>,

    stats: CacheStats,
}

impl CacheState {
    fn new(config: CacheConfig, capacity: NonZeroUsize) -> Self {
        let mut state = Self {
            config,
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        };
        state.refresh_counts();
        state
    }

    fn refresh_counts(&mut self) {
        self.stats.entry_count = self.entries.len();
        self.stats.capacity = self.entries.cap().get();
    }
}

fn capacity_of(config: &CacheConfig) -> Result<NonZeroUsize> {
    config.validate()?;
    NonZeroUsize::new(config.capacity())
        .ok_or_else(|| Error::InvalidCapacity("capacity must be greater than 0".into()))
}

/// Shared store of image resources keyed by locator
///
/// Build one per process (or per gallery feature), wrap it in an `Arc` and
/// pass it to every [`CacheBoundView`](crate::CacheBoundView).
///
/// # Example
///
/// ```
/// use thumbcache::{ResourceAttributes, ResourceCache};
///
/// let cache = ResourceCache::builder()
///     .page_size(8)
///     .prefetch_count(3)
///     .build()
///     .unwrap();
///
/// let attrs = ResourceAttributes::new().alt_text("Harbour at dusk");
/// let first = cache.get_or_create("https://photos/1.jpg", true, &attrs).unwrap();
/// let again = cache.get_or_create("https://photos/1.jpg", true, &attrs).unwrap();
/// assert_eq!(first, again);
///
/// // Peeking never allocates
/// assert!(cache.get_or_create("https://photos/2.jpg", false, &attrs).is_none());
/// assert_eq!(cache.len(), 1);
/// ```
pub struct ResourceCache {
    state: Mutex<CacheState>,
    loader: Arc<dyn ResourceLoader>,
    events: EventManager,
}

impl ResourceCache {
    /// Create a cache with the given sizing and loader
    ///
    /// # Errors
    ///
    /// Returns an error if the configured capacity is 0 or above
    /// [`MAX_CAPACITY`](crate::config::MAX_CAPACITY).
    pub fn new(config: CacheConfig, loader: Arc<dyn ResourceLoader>) -> Result<Self> {
        let capacity = capacity_of(&config)?;
        info!(
            "Resource cache ready: {} per page + {} lookahead = {} entries",
            config.page_size,
            config.prefetch_count,
            capacity
        );

        Ok(Self {
            state: Mutex::new(CacheState::new(config, capacity)),
            loader,
            events: EventManager::new(),
        })
    }

    /// Create a builder for configuring a cache
    pub fn builder() -> ResourceCacheBuilder {
        ResourceCacheBuilder::new()
    }

    /// Return the resource for `locator`, creating it if allowed
    ///
    /// - Cached: the entry becomes most recently used, `attributes` are applied
    ///   to it and the same handle is returned.
    /// - Not cached and `should_create` is false: returns `None` with no side
    ///   effect on size or recency.
    /// - Not cached and `should_create` is true: a new resource is created with
    ///   `attributes`, inserted as most recently used, and its load is handed to
    ///   the loader. If the cache was full, the least recently used entry is
    ///   evicted, whether or not a view still shows it.
    ///
    /// An empty locator never creates anything.
    pub fn get_or_create(
        &self,
        locator: &str,
        should_create: bool,
        attributes: &ResourceAttributes,
    ) -> Option<ResourceHandle> {
        if locator.is_empty() {
            debug!("Ignoring request for empty locator");
            return None;
        }

        let mut state = self.state.lock_recovered();

        if let Some(handle) = state.entries.get(locator).cloned() {
            state.stats.hits += 1;
            drop(state);

            handle.apply(attributes);
            self.events.notify(&CacheEvent::Hit {
                locator: locator.to_string(),
            });
            return Some(handle);
        }

        state.stats.misses += 1;
        if !should_create {
            return None;
        }

        let handle = ResourceHandle::new(locator);
        handle.apply(attributes);
        let evicted = state.entries.push(locator.to_string(), handle.clone());
        state.stats.creations += 1;
        if evicted.is_some() {
            state.stats.evictions += 1;
        }
        state.refresh_counts();
        let ticket = handle.begin_load();
        drop(state);

        if let Some((victim_locator, victim)) = evicted {
            self.retire(&victim_locator, victim);
        }

        debug!("Created resource for {locator}");
        self.events.notify(&CacheEvent::Created {
            locator: locator.to_string(),
        });
        self.loader.load(ticket);

        Some(handle)
    }

    /// Look up a cached resource, marking it most recently used
    pub fn get(&self, locator: &str) -> Option<ResourceHandle> {
        let handle = {
            let mut state = self.state.lock_recovered();
            let handle = state.entries.get(locator).cloned();
            if handle.is_some() {
                state.stats.hits += 1;
            } else {
                state.stats.misses += 1;
            }
            handle
        };

        if handle.is_some() {
            self.events.notify(&CacheEvent::Hit {
                locator: locator.to_string(),
            });
        }
        handle
    }

    /// Look up a cached resource without touching recency or statistics
    pub fn peek(&self, locator: &str) -> Option<ResourceHandle> {
        self.state.lock_recovered().entries.peek(locator).cloned()
    }

    /// Check if a locator is cached without touching recency
    pub fn contains(&self, locator: &str) -> bool {
        self.state.lock_recovered().entries.contains(locator)
    }

    /// Remove every entry
    ///
    /// Loads still pending for resources no slot holds are cancelled. A
    /// resource still mounted in a slot keeps loading and its callback still
    /// fires. Handles held by views stay valid, but the next request for
    /// their locator creates a fresh resource.
    pub fn clear(&self) {
        let removed: Vec<ResourceHandle> = {
            let mut state = self.state.lock_recovered();
            let handles = state
                .entries
                .iter()
                .map(|(_, handle)| handle.clone())
                .collect();
            state.entries.clear();
            state.stats.clears += 1;
            state.refresh_counts();
            handles
        };

        let cancelled = removed
            .iter()
            .filter(|handle| !handle.is_attached() && handle.cancel_pending_load())
            .count();
        info!(
            "Cleared resource cache: {} entries, {} pending loads cancelled",
            removed.len(),
            cancelled
        );
        self.events.notify(&CacheEvent::Cleared {
            removed: removed.len(),
        });
    }

    /// Change the cache sizing
    ///
    /// Shrinking evicts least recently used entries until the cache fits.
    ///
    /// # Errors
    ///
    /// Returns an error if the new capacity is 0 or above
    /// [`MAX_CAPACITY`](crate::config::MAX_CAPACITY); the cache is left unchanged.
    pub fn reconfigure(&self, config: CacheConfig) -> Result<()> {
        let capacity = capacity_of(&config)?;

        let victims = {
            let mut state = self.state.lock_recovered();
            let mut victims = Vec::new();
            while state.entries.len() > capacity.get() {
                match state.entries.pop_lru() {
                    Some(entry) => victims.push(entry),
                    None => break,
                }
            }
            state.entries.resize(capacity);
            state.config = config;
            state.stats.evictions += victims.len() as u64;
            state.refresh_counts();
            victims
        };

        info!(
            "Resource cache resized to {} entries ({} evicted)",
            capacity,
            victims.len()
        );
        for (locator, victim) in victims {
            self.retire(&locator, victim);
        }
        Ok(())
    }

    /// Drop bookkeeping for an evicted resource
    ///
    /// A pending load is cancelled unless a view is still showing the
    /// resource, in which case that view keeps waiting for it.
    fn retire(&self, locator: &str, victim: ResourceHandle) {
        let was_pending = victim.is_pending();
        if was_pending && !victim.is_attached() {
            victim.cancel_pending_load();
        }
        debug!("Evicted {locator} (pending: {was_pending})");
        self.events.notify(&CacheEvent::Evicted {
            locator: locator.to_string(),
            was_pending,
        });
    }

    /// Register a listener for cache events
    pub fn on_event<F>(&self, callback: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.events.on_event(callback);
    }

    pub(crate) fn events(&self) -> &EventManager {
        &self.events
    }

    /// Cached locators, most recently used first
    pub fn locators(&self) -> Vec<String> {
        self.state
            .lock_recovered()
            .entries
            .iter()
            .map(|(locator, _)| locator.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock_recovered().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.lock_recovered().entries.cap().get()
    }

    pub fn config(&self) -> CacheConfig {
        self.state.lock_recovered().config
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        self.state.lock_recovered().stats
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock_recovered();
        f.debug_struct("ResourceCache")
            .field("len", &state.entries.len())
            .field("capacity", &state.entries.cap())
            .field("config", &state.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ImmediateLoader, LoadTicket};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with(page_size: usize, prefetch_count: usize) -> ResourceCache {
        ResourceCache::builder()
            .page_size(page_size)
            .prefetch_count(prefetch_count)
            .build()
            .unwrap()
    }

    fn attrs() -> ResourceAttributes {
        ResourceAttributes::new()
    }

    #[test]
    fn test_miss_creates_and_hit_returns_same_handle() {
        let cache = cache_with(2, 1);

        let first = cache.get_or_create("a", true, &attrs()).unwrap();
        let second = cache.get_or_create("a", true, &attrs()).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.creations, 1);
    }

    #[test]
    fn test_peek_without_create_has_no_side_effect() {
        let cache = cache_with(2, 0);
        cache.get_or_create("a", true, &attrs());
        cache.get_or_create("b", true, &attrs());

        assert!(cache.get_or_create("c", false, &attrs()).is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.locators(), vec!["b", "a"]);
    }

    #[test]
    fn test_empty_locator_never_created() {
        let cache = cache_with(2, 0);
        assert!(cache.get_or_create("", true, &attrs()).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_lru_eviction_order() {
        let cache = cache_with(2, 1);
        for locator in ["a", "b", "c"] {
            cache.get_or_create(locator, true, &attrs());
        }

        // Refresh "a", then overflow
        assert!(cache.get("a").is_some());
        cache.get_or_create("d", true, &attrs());

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_peek_does_not_refresh() {
        let cache = cache_with(2, 0);
        cache.get_or_create("a", true, &attrs());
        cache.get_or_create("b", true, &attrs());

        assert!(cache.peek("a").is_some());
        cache.get_or_create("c", true, &attrs());

        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_loader_called_once_per_creation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let cache = ResourceCache::builder()
            .with_loader(move |ticket: LoadTicket| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                ticket.mark_ready();
            })
            .build()
            .unwrap();

        cache.get_or_create("a", true, &attrs());
        cache.get_or_create("a", true, &attrs());
        cache.get_or_create("a", true, &attrs());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.peek("a").unwrap().is_ready());
    }

    #[test]
    fn test_eviction_cancels_unattached_pending_load() {
        let tickets = Arc::new(Mutex::new(Vec::new()));
        let tickets_clone = Arc::clone(&tickets);
        let cache = ResourceCache::builder()
            .page_size(1)
            .prefetch_count(0)
            .with_loader(move |ticket: LoadTicket| {
                tickets_clone.lock().unwrap().push(ticket);
            })
            .build()
            .unwrap();

        let first = cache.get_or_create("a", true, &attrs()).unwrap();
        cache.get_or_create("b", true, &attrs());

        let tickets = tickets.lock().unwrap();
        assert!(tickets[0].is_cancelled());
        assert!(!tickets[1].is_cancelled());
        assert!(first.is_pending());
    }

    #[test]
    fn test_reconfigure_shrinks_from_lru_end() {
        let cache = cache_with(4, 0);
        for locator in ["a", "b", "c", "d"] {
            cache.get_or_create(locator, true, &attrs());
        }

        cache
            .reconfigure(CacheConfig::builder().page_size(2).prefetch_count(0).build())
            .unwrap();

        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.locators(), vec!["d", "c"]);
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_reconfigure_rejects_zero() {
        let cache = cache_with(2, 0);
        let result = cache.reconfigure(CacheConfig::builder().page_size(0).prefetch_count(0).build());

        assert!(result.is_err());
        assert_eq!(cache.capacity(), 2);

        let result = cache.reconfigure(CacheConfig::builder().page_size(usize::MAX).build());
        assert!(result.is_err());
        assert_eq!(cache.capacity(), 2);
    }

    #[test]
    fn test_clear_resets_entries() {
        let cache = ResourceCache::new(CacheConfig::default(), Arc::new(ImmediateLoader)).unwrap();
        let old = cache.get_or_create("a", true, &attrs()).unwrap();

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().clears, 1);

        let fresh = cache.get_or_create("a", true, &attrs()).unwrap();
        assert_ne!(old, fresh);
    }
}
