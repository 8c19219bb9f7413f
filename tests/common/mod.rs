//! Common test utilities for thumbcache integration tests
//!
//! Provides a loader that holds tickets until the test finishes them, an
//! event recorder and cache fixtures.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use thumbcache::{CacheEvent, LoadTicket, ResourceCache, ResourceLoader};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Loader
// =============================================================================

/// Loader that keeps every ticket so the test decides when loads finish
#[derive(Default)]
pub struct RecordingLoader {
    tickets: Mutex<Vec<LoadTicket>>,
    requested: Mutex<Vec<String>>,
}

impl RecordingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Locators passed to the loader, in call order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub fn pending(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    /// Whether the held ticket for `locator` was cancelled
    pub fn is_cancelled(&self, locator: &str) -> Option<bool> {
        self.tickets
            .lock()
            .unwrap()
            .iter()
            .find(|ticket| ticket.locator() == locator)
            .map(LoadTicket::is_cancelled)
    }

    fn take(&self, locator: &str) -> Option<LoadTicket> {
        let mut tickets = self.tickets.lock().unwrap();
        let index = tickets
            .iter()
            .position(|ticket| ticket.locator() == locator)?;
        Some(tickets.remove(index))
    }

    /// Finish the load for `locator` as ready
    pub fn finish(&self, locator: &str) -> bool {
        match self.take(locator) {
            Some(ticket) => {
                ticket.mark_ready();
                true
            }
            None => false,
        }
    }

    /// Finish the load for `locator` as failed
    pub fn fail(&self, locator: &str, reason: &str) -> bool {
        match self.take(locator) {
            Some(ticket) => {
                ticket.fail(reason);
                true
            }
            None => false,
        }
    }

    /// Finish every held load as ready
    pub fn complete_all(&self) {
        let tickets: Vec<LoadTicket> = self.tickets.lock().unwrap().drain(..).collect();
        for ticket in tickets {
            ticket.mark_ready();
        }
    }
}

impl ResourceLoader for RecordingLoader {
    fn load(&self, ticket: LoadTicket) {
        self.requested
            .lock()
            .unwrap()
            .push(ticket.locator().to_string());
        self.tickets.lock().unwrap().push(ticket);
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A cache wired to a [`RecordingLoader`] and an event recorder
pub struct TestFixture {
    pub cache: Arc<ResourceCache>,
    pub loader: Arc<RecordingLoader>,
    pub events: Arc<Mutex<Vec<CacheEvent>>>,
}

impl TestFixture {
    /// Default sizing: 8 per page + 3 lookahead
    pub fn new() -> Self {
        Self::with_sizing(8, 3)
    }

    pub fn with_sizing(page_size: usize, prefetch_count: usize) -> Self {
        init_logging();

        let loader = RecordingLoader::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);

        let cache = ResourceCache::builder()
            .page_size(page_size)
            .prefetch_count(prefetch_count)
            .with_shared_loader(loader.clone())
            .on_event(move |event| events_clone.lock().unwrap().push(event.clone()))
            .build_shared()
            .unwrap();

        Self {
            cache,
            loader,
            events,
        }
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Locators evicted so far, in order
    pub fn evicted(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                CacheEvent::Evicted { locator, .. } => Some(locator),
                _ => None,
            })
            .collect()
    }
}

/// Locator for the n-th photo of a gallery
pub fn photo(n: usize) -> String {
    format!("https://gallery.example/photos/{n}.jpg")
}
