//! Event system for cache activity
//!
//! Provides observer callbacks for entries being created, hit, evicted or
//! cleared.

use crate::sync::RwLockExt;
use std::sync::{Arc, RwLock};

/// Something that happened to the cache table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A new resource was allocated and its load started
    Created { locator: String },
    /// An existing resource was returned and refreshed to most recently used
    Hit { locator: String },
    /// The least recently used resource was dropped to make room
    Evicted {
        locator: String,
        /// The load had not finished when the entry was dropped
        was_pending: bool,
    },
    /// Every entry was removed
    Cleared { removed: usize },
}

impl CacheEvent {
    /// Locator the event refers to, if it is about a single entry
    pub fn locator(&self) -> Option<&str> {
        match self {
            CacheEvent::Created { locator }
            | CacheEvent::Hit { locator }
            | CacheEvent::Evicted { locator, .. } => Some(locator),
            CacheEvent::Cleared { .. } => None,
        }
    }
}

/// Type alias for an event callback
pub type EventCallback = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

/// Manages listeners for cache events
pub struct EventManager {
    listeners: RwLock<Vec<EventCallback>>,
}

impl EventManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener called for every event
    pub fn on_event<F>(&self, callback: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.add(Arc::new(callback));
    }

    pub(crate) fn add(&self, callback: EventCallback) {
        self.listeners.write_recovered().push(callback);
    }

    /// Notify all listeners
    ///
    /// Listeners run after the listener lock is released, so they may
    /// register further listeners or call back into the cache.
    pub fn notify(&self, event: &CacheEvent) {
        let listeners: Vec<EventCallback> = self.listeners.read_recovered().clone();
        for callback in &listeners {
            callback(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read_recovered().len()
    }

    /// Remove all listeners
    pub fn clear(&self) {
        self.listeners.write_recovered().clear();
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_listener_receives_events_in_order() {
        let events = EventManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        events.on_event(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        });

        events.notify(&CacheEvent::Created {
            locator: "a".into(),
        });
        events.notify(&CacheEvent::Cleared { removed: 1 });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].locator(), Some("a"));
        assert_eq!(seen[1], CacheEvent::Cleared { removed: 1 });
    }

    #[test]
    fn test_listener_may_register_listener() {
        let events = Arc::new(EventManager::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let events_clone = Arc::clone(&events);
        let counter_clone = Arc::clone(&counter);

        events.on_event(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            if events_clone.listener_count() == 1 {
                events_clone.on_event(|_| {});
            }
        });

        events.notify(&CacheEvent::Cleared { removed: 0 });
        assert_eq!(events.listener_count(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_listeners() {
        let events = EventManager::new();
        events.on_event(|_| {});
        events.clear();
        assert_eq!(events.listener_count(), 0);
    }
}
