//! Cached image resources and their presentation attributes
//!
//! A [`ResourceHandle`] is a shared reference to one host resource. Cloning
//! the handle never copies the resource, and two handles compare equal only
//! when they point at the same resource.

use crate::loader::{CancellationToken, LoadTicket};
use crate::sync::MutexExt;
use crate::view::SlotId;
use log::{debug, warn};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Callback fired when a resource becomes ready to display
pub type ReadyCallback = Arc<dyn Fn(&ResourceHandle) + Send + Sync>;

/// Type-erased native image object produced by the loader
pub(crate) type Payload = Arc<dyn Any + Send + Sync>;

/// Load state of a resource, driven by the host
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    /// Load started, no outcome yet
    #[default]
    Pending,
    /// Decoded and displayable
    Ready,
    /// Fetch or decode failed
    Failed(String),
}

/// Presentation attributes applied to a resource on every request
///
/// Style entries are merged into the existing style, alternate text replaces
/// the previous text when present, and the callback replaces the previous
/// callback when present.
#[derive(Clone, Default)]
pub struct ResourceAttributes {
    /// Visual attributes merged into the resource style
    pub style: HashMap<String, String>,

    /// Alternate/accessibility text
    pub alt_text: Option<String>,

    /// Completion callback
    pub on_ready: Option<ReadyCallback>,
}

impl ResourceAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn alt_text(mut self, text: impl Into<String>) -> Self {
        self.alt_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn on_ready<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ResourceHandle) + Send + Sync + 'static,
    {
        self.on_ready = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for ResourceAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceAttributes")
            .field("style", &self.style)
            .field("alt_text", &self.alt_text)
            .field("on_ready", &self.on_ready.as_ref().map(|_| "Some(Fn)"))
            .finish()
    }
}

#[derive(Default)]
struct HandleState {
    style: HashMap<String, String>,
    alt_text: Option<String>,
    on_ready: Option<ReadyCallback>,
    attached_to: Option<SlotId>,
    readiness: Readiness,
    payload: Option<Payload>,
    load_token: Option<CancellationToken>,
}

pub(crate) struct HandleInner {
    locator: String,
    state: Mutex<HandleState>,
}

/// Shared reference to a cached image resource
///
/// Exposes the capability set a host needs: attach to a slot, detach,
/// set style, set alternate text and register a completion callback.
#[derive(Clone)]
pub struct ResourceHandle {
    inner: Arc<HandleInner>,
}

impl ResourceHandle {
    pub(crate) fn new(locator: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                locator: locator.into(),
                state: Mutex::new(HandleState::default()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<HandleInner>) -> Self {
        Self { inner }
    }

    /// The locator this resource was created for
    pub fn locator(&self) -> &str {
        &self.inner.locator
    }

    /// Check whether two handles refer to the same resource
    pub fn same_resource(&self, other: &ResourceHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Readiness
    // -------------------------------------------------------------------------

    pub fn readiness(&self) -> Readiness {
        self.inner.state.lock_recovered().readiness.clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.inner.state.lock_recovered().readiness, Readiness::Ready)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.inner.state.lock_recovered().readiness, Readiness::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self.inner.state.lock_recovered().readiness,
            Readiness::Failed(_)
        )
    }

    /// The native image object stored by the loader, if it has the given type
    ///
    /// Returns `None` while pending, after a failure, when the loader stored
    /// no payload or when the type doesn't match.
    pub fn payload<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let payload = self.inner.state.lock_recovered().payload.clone()?;
        payload.downcast::<T>().ok()
    }

    // -------------------------------------------------------------------------
    // Presentation
    // -------------------------------------------------------------------------

    pub fn style(&self) -> HashMap<String, String> {
        self.inner.state.lock_recovered().style.clone()
    }

    pub fn style_value(&self, key: &str) -> Option<String> {
        self.inner.state.lock_recovered().style.get(key).cloned()
    }

    pub fn alt_text(&self) -> Option<String> {
        self.inner.state.lock_recovered().alt_text.clone()
    }

    /// Merge entries into the style, keeping keys not mentioned
    pub fn set_style(&self, style: &HashMap<String, String>) {
        let mut state = self.inner.state.lock_recovered();
        for (key, value) in style {
            state.style.insert(key.clone(), value.clone());
        }
    }

    pub fn set_alt_text(&self, text: impl Into<String>) {
        self.inner.state.lock_recovered().alt_text = Some(text.into());
    }

    /// Replace the completion callback
    ///
    /// If the resource is already ready the callback runs immediately, since
    /// the ready transition will not happen again.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: Fn(&ResourceHandle) + Send + Sync + 'static,
    {
        self.rebind_callback(Arc::new(callback));
    }

    fn rebind_callback(&self, callback: ReadyCallback) {
        let fire = {
            let mut state = self.inner.state.lock_recovered();
            state.on_ready = Some(Arc::clone(&callback));
            matches!(state.readiness, Readiness::Ready)
        };
        if fire {
            callback(self);
        }
    }

    /// Apply request-time attributes to this resource
    pub(crate) fn apply(&self, attributes: &ResourceAttributes) {
        {
            let mut state = self.inner.state.lock_recovered();
            for (key, value) in &attributes.style {
                state.style.insert(key.clone(), value.clone());
            }
            if let Some(text) = &attributes.alt_text {
                state.alt_text = Some(text.clone());
            }
        }
        if let Some(callback) = &attributes.on_ready {
            self.rebind_callback(Arc::clone(callback));
        }
    }

    // -------------------------------------------------------------------------
    // Attachment
    // -------------------------------------------------------------------------

    /// Slot currently holding this resource
    pub fn attached_to(&self) -> Option<SlotId> {
        self.inner.state.lock_recovered().attached_to
    }

    pub fn is_attached(&self) -> bool {
        self.attached_to().is_some()
    }

    /// Attach to a slot, returning the slot it was taken from
    ///
    /// A resource sits in one slot at a time; attaching elsewhere moves it.
    pub fn attach(&self, slot: SlotId) -> Option<SlotId> {
        let mut state = self.inner.state.lock_recovered();
        let previous = state.attached_to.replace(slot);
        previous.filter(|prev| *prev != slot)
    }

    /// Detach from `slot`
    ///
    /// Returns `false` without changing anything when the resource has
    /// already moved to another slot.
    pub fn detach(&self, slot: SlotId) -> bool {
        let mut state = self.inner.state.lock_recovered();
        if state.attached_to == Some(slot) {
            state.attached_to = None;
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Create the ticket for this resource's load
    pub(crate) fn begin_load(&self) -> LoadTicket {
        let token = CancellationToken::new();
        self.inner.state.lock_recovered().load_token = Some(token.clone());
        LoadTicket::new(self.locator(), Arc::downgrade(&self.inner), token)
    }

    /// Cancel the load if it has not finished yet
    ///
    /// Returns `true` if a pending load was cancelled.
    pub(crate) fn cancel_pending_load(&self) -> bool {
        let token = {
            let mut state = self.inner.state.lock_recovered();
            if !matches!(state.readiness, Readiness::Pending) {
                return false;
            }
            state.load_token.take()
        };
        match token {
            Some(token) => {
                token.cancel();
                debug!("Cancelled pending load for {}", self.locator());
                true
            }
            None => false,
        }
    }

    /// Record the outcome of a load
    pub(crate) fn finish_load(
        &self,
        token: &CancellationToken,
        outcome: std::result::Result<Option<Payload>, String>,
    ) {
        let callback = {
            let mut state = self.inner.state.lock_recovered();
            if token.is_cancelled() || !matches!(state.readiness, Readiness::Pending) {
                debug!("Discarding late load result for {}", self.locator());
                return;
            }
            state.load_token = None;
            match outcome {
                Ok(payload) => {
                    state.readiness = Readiness::Ready;
                    state.payload = payload;
                    state.on_ready.clone()
                }
                Err(reason) => {
                    warn!("Failed to load {}: {}", self.locator(), reason);
                    state.readiness = Readiness::Failed(reason);
                    None
                }
            }
        };
        if let Some(callback) = callback {
            callback(self);
        }
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> std::sync::Weak<HandleInner> {
        Arc::downgrade(&self.inner)
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_resource(other)
    }
}

impl Eq for ResourceHandle {}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock_recovered();
        f.debug_struct("ResourceHandle")
            .field("locator", &self.inner.locator)
            .field("readiness", &state.readiness)
            .field("attached_to", &state.attached_to)
            .finish()
    }
}
