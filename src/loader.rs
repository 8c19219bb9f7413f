//! Asynchronous resource loading
//!
//! The cache never fetches or decodes anything itself. On a miss it hands a
//! [`LoadTicket`] to the host's [`ResourceLoader`], and the host finishes the
//! ticket whenever the fetch and decode complete. Each ticket carries a
//! [`CancellationToken`] that is cancelled when the resource is dropped from
//! the cache before its load finished.

use crate::resource::{HandleInner, Payload, ResourceHandle};
use log::debug;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Cancellation token for cooperative load cancellation
///
/// Loaders can check `is_cancelled()` to stop fetching or decoding a resource
/// nobody will display. All clones share the same state.
///
/// # Example
///
/// ```
/// use thumbcache::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker_token = token.clone();
///
/// token.cancel();
/// assert!(worker_token.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token in the non-cancelled state
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancel this token and all of its clones
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// One pending load, handed to the loader on a cache miss
///
/// The ticket only holds a weak reference to its resource: finishing a ticket
/// whose resource has since been dropped does nothing.
pub struct LoadTicket {
    locator: String,
    resource: Weak<HandleInner>,
    token: CancellationToken,
}

impl LoadTicket {
    pub(crate) fn new(
        locator: impl Into<String>,
        resource: Weak<HandleInner>,
        token: CancellationToken,
    ) -> Self {
        Self {
            locator: locator.into(),
            resource,
            token,
        }
    }

    /// Locator to fetch
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Whether the resource was abandoned before this load finished
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.resource.strong_count() == 0
    }

    /// Token a background worker can poll while fetching
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Finish the load, storing the decoded image object
    ///
    /// The object is retrievable through [`ResourceHandle::payload`].
    pub fn complete<T: Any + Send + Sync>(self, payload: T) {
        let payload: Payload = Arc::new(payload);
        self.finish(Ok(Some(payload)));
    }

    /// Finish the load without a payload
    pub fn mark_ready(self) {
        self.finish(Ok(None));
    }

    /// Finish the load as failed
    pub fn fail(self, reason: impl Into<String>) {
        self.finish(Err(reason.into()));
    }

    fn finish(self, outcome: std::result::Result<Option<Payload>, String>) {
        match self.resource.upgrade() {
            Some(inner) => ResourceHandle::from_inner(inner).finish_load(&self.token, outcome),
            None => debug!("Resource for {} was dropped, ignoring load result", self.locator),
        }
    }
}

impl fmt::Debug for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTicket")
            .field("locator", &self.locator)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Host hook that starts loading a resource
///
/// `load` is called outside of any cache lock and may finish the ticket
/// synchronously or keep it and finish it later. Any
/// `Fn(LoadTicket) + Send + Sync` closure is a loader.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, ticket: LoadTicket);
}

impl<F> ResourceLoader for F
where
    F: Fn(LoadTicket) + Send + Sync,
{
    fn load(&self, ticket: LoadTicket) {
        self(ticket)
    }
}

/// Loader that reports every resource ready at once, without a payload
///
/// Suitable for hosts where the native image element fetches its own source
/// and the cache only has to keep the element alive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateLoader;

impl ResourceLoader for ImmediateLoader {
    fn load(&self, ticket: LoadTicket) {
        ticket.mark_ready();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_token_cancellation_shared_by_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_ticket_for_dropped_resource_reports_cancelled() {
        let handle = ResourceHandle::new("a");
        let ticket = handle.begin_load();
        assert!(!ticket.is_cancelled());

        drop(handle);
        assert!(ticket.is_cancelled());
        ticket.mark_ready();
    }

    #[test]
    fn test_closure_loader() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let loader = move |ticket: LoadTicket| {
            seen_clone.lock().unwrap().push(ticket.locator().to_string());
            ticket.fail("offline");
        };

        let handle = ResourceHandle::new("https://img/2.jpg");
        loader.load(handle.begin_load());

        assert_eq!(*seen.lock().unwrap(), vec!["https://img/2.jpg".to_string()]);
        assert!(handle.is_failed());
    }

    #[test]
    fn test_immediate_loader() {
        let handle = ResourceHandle::new("a");
        ImmediateLoader.load(handle.begin_load());
        assert!(handle.is_ready());
    }
}
