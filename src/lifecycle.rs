//! Cache lifetime tied to a feature scope
//!
//! A gallery screen usually wants the cache only while it is open. Entering a
//! [`CacheScope`] hands out views bound to one cache; leaving it (explicitly
//! or by drop) clears the cache. Pending loads nobody is showing are
//! cancelled; a view still mounted keeps waiting for its resource.

use crate::cache::ResourceCache;
use crate::view::CacheBoundView;
use log::info;
use std::sync::Arc;

/// Guard that clears a shared cache when the owning feature shuts down
///
/// # Example
///
/// ```
/// use thumbcache::{CacheScope, ResourceCache, ViewOptions, ViewSlot};
///
/// let cache = ResourceCache::builder().build_shared().unwrap();
/// {
///     let scope = CacheScope::enter(cache.clone());
///     let mut slot = ViewSlot::new();
///     scope.view().bind("https://photos/3.jpg", &mut slot, &ViewOptions::new());
///     assert_eq!(cache.len(), 1);
/// }
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct CacheScope {
    cache: Arc<ResourceCache>,
}

impl CacheScope {
    pub fn enter(cache: Arc<ResourceCache>) -> Self {
        info!("Entering cache scope (capacity {})", cache.capacity());
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// A view adapter sharing this scope's cache
    pub fn view(&self) -> CacheBoundView {
        CacheBoundView::new(Arc::clone(&self.cache))
    }

    /// Leave the scope now instead of at drop
    pub fn exit(self) {}
}

impl Drop for CacheScope {
    fn drop(&mut self) {
        info!("Leaving cache scope, releasing {} resources", self.cache.len());
        self.cache.clear();
    }
}
