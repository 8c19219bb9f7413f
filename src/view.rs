//! Binding cached resources into view-owned slots
//!
//! A view owns a [`ViewSlot`] for as long as it is mounted. Binding puts the
//! cached resource for a locator into the slot; unbinding (or dropping the
//! slot) takes it out again. Neither touches cache membership: the resource
//! stays cached after the view goes away and the next view asking for the same
//! locator gets the very same resource back.

use crate::cache::ResourceCache;
use crate::resource::{ResourceAttributes, ResourceHandle};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a view slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// What a view asks for when it binds a locator
///
/// `attributes` are applied to the shared resource. `class_name` and
/// `slot_style` are per-view presentation and stay on the slot.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    /// Create the resource on a miss (default: true)
    pub should_create: bool,

    /// Attributes applied to the cached resource
    pub attributes: ResourceAttributes,

    /// Presentation class for this view only
    pub class_name: Option<String>,

    /// Visual attributes for this view only
    pub slot_style: HashMap<String, String>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            should_create: true,
            attributes: ResourceAttributes::default(),
            class_name: None,
            slot_style: HashMap::new(),
        }
    }
}

impl ViewOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only bind a resource that is already cached
    #[must_use]
    pub fn no_create(mut self) -> Self {
        self.should_create = false;
        self
    }

    #[must_use]
    pub fn attributes(mut self, attributes: ResourceAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes = self.attributes.style(key, value);
        self
    }

    #[must_use]
    pub fn alt_text(mut self, text: impl Into<String>) -> Self {
        self.attributes = self.attributes.alt_text(text);
        self
    }

    #[must_use]
    pub fn on_ready<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ResourceHandle) + Send + Sync + 'static,
    {
        self.attributes = self.attributes.on_ready(callback);
        self
    }

    #[must_use]
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    #[must_use]
    pub fn slot_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slot_style.insert(key.into(), value.into());
        self
    }
}

/// Mount point owned by one view instance
///
/// Holds at most one resource. Dropping the slot unbinds it.
pub struct ViewSlot {
    id: SlotId,
    handle: Option<ResourceHandle>,
    class_name: Option<String>,
    slot_style: HashMap<String, String>,
}

impl ViewSlot {
    /// Create an empty slot for a newly mounted view
    pub fn new() -> Self {
        Self {
            id: SlotId::next(),
            handle: None,
            class_name: None,
            slot_style: HashMap::new(),
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    /// The resource most recently bound into this slot
    ///
    /// It may have been moved to another slot since; see [`is_holding`](Self::is_holding).
    pub fn handle(&self) -> Option<&ResourceHandle> {
        self.handle.as_ref()
    }

    pub fn locator(&self) -> Option<&str> {
        self.handle.as_ref().map(ResourceHandle::locator)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn slot_style(&self) -> &HashMap<String, String> {
        &self.slot_style
    }

    /// Whether the bound resource is attached here right now
    ///
    /// `false` for an empty slot, or when another slot took the resource.
    /// A slot that is not holding renders as an empty placeholder.
    pub fn is_holding(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.attached_to() == Some(self.id))
    }

    pub fn is_empty(&self) -> bool {
        self.handle.is_none()
    }

    fn attach(&mut self, handle: ResourceHandle, options: &ViewOptions) {
        if let Some(previous) = handle.attach(self.id) {
            debug!(
                "Moving {} from {} to {}",
                handle.locator(),
                previous,
                self.id
            );
        }
        self.class_name = options.class_name.clone();
        self.slot_style = options.slot_style.clone();
        self.handle = Some(handle);
    }

    /// Clear the slot, detaching its resource if it is still attached here
    ///
    /// Returns `true` if a resource was detached.
    fn release(&mut self) -> bool {
        self.class_name = None;
        self.slot_style.clear();

        let Some(handle) = self.handle.take() else {
            return false;
        };

        let detached = handle.detach(self.id);
        if !detached {
            debug!(
                "{} no longer holds {}, nothing to detach",
                self.id,
                handle.locator()
            );
        }
        detached
    }
}

impl Default for ViewSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewSlot {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ViewSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSlot")
            .field("id", &self.id)
            .field("locator", &self.locator())
            .field("holding", &self.is_holding())
            .field("class_name", &self.class_name)
            .finish()
    }
}

/// Adapter between view mount/unmount and the shared cache
///
/// # Example
///
/// ```
/// use thumbcache::{CacheBoundView, ResourceCache, ViewOptions, ViewSlot};
///
/// let cache = ResourceCache::builder().build_shared().unwrap();
/// let view = CacheBoundView::new(cache.clone());
///
/// let mut thumbnail = ViewSlot::new();
/// view.bind("https://photos/7.jpg", &mut thumbnail, &ViewOptions::new().class_name("thumb"));
/// assert!(thumbnail.is_holding());
///
/// // Unmount: the resource stays cached
/// drop(thumbnail);
/// assert!(cache.contains("https://photos/7.jpg"));
/// ```
#[derive(Clone)]
pub struct CacheBoundView {
    cache: Arc<ResourceCache>,
}

impl CacheBoundView {
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Bind the resource for `locator` into `slot`
    ///
    /// Any previous binding of the slot is released first, so a slot never
    /// holds two resources. Returns the bound resource, or `None` when the
    /// locator is not cached and `options.should_create` is false; the slot
    /// is then left empty.
    pub fn bind(
        &self,
        locator: &str,
        slot: &mut ViewSlot,
        options: &ViewOptions,
    ) -> Option<ResourceHandle> {
        self.unbind(slot);

        let handle = self
            .cache
            .get_or_create(locator, options.should_create, &options.attributes)?;
        slot.attach(handle.clone(), options);
        Some(handle)
    }

    /// Release the slot's binding without touching the cache
    ///
    /// Detaches the resource only if it is still attached to this slot.
    /// Unbinding an empty or stale slot is a no-op.
    pub fn unbind(&self, slot: &mut ViewSlot) {
        slot.release();
    }
}

impl fmt::Debug for CacheBoundView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBoundView")
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> CacheBoundView {
        CacheBoundView::new(ResourceCache::builder().build_shared().unwrap())
    }

    #[test]
    fn test_slot_ids_are_unique() {
        let a = ViewSlot::new();
        let b = ViewSlot::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_bind_attaches_and_keeps_presentation_on_slot() {
        let view = view();
        let mut slot = ViewSlot::new();

        let options = ViewOptions::new()
            .class_name("grid-thumb")
            .slot_style("opacity", "1")
            .style("object-fit", "cover");
        let handle = view.bind("a", &mut slot, &options).unwrap();

        assert!(slot.is_holding());
        assert_eq!(handle.attached_to(), Some(slot.id()));
        assert_eq!(slot.class_name(), Some("grid-thumb"));
        assert_eq!(slot.slot_style().get("opacity").map(String::as_str), Some("1"));
        assert_eq!(handle.style_value("object-fit").as_deref(), Some("cover"));
        assert!(handle.style_value("opacity").is_none());
    }

    #[test]
    fn test_bind_without_create_leaves_slot_empty() {
        let view = view();
        let mut slot = ViewSlot::new();

        assert!(view.bind("a", &mut slot, &ViewOptions::new().no_create()).is_none());
        assert!(slot.is_empty());
        assert!(!slot.is_holding());
        assert!(view.cache().is_empty());
    }

    #[test]
    fn test_rebind_releases_previous_resource_first() {
        let view = view();
        let mut slot = ViewSlot::new();

        let first = view.bind("a", &mut slot, &ViewOptions::new()).unwrap();
        let second = view.bind("b", &mut slot, &ViewOptions::new()).unwrap();

        assert!(!first.is_attached());
        assert_eq!(second.attached_to(), Some(slot.id()));
        assert_eq!(slot.locator(), Some("b"));
        assert!(view.cache().contains("a"));
    }

    #[test]
    fn test_unbind_is_noop_on_empty_slot() {
        let view = view();
        let mut slot = ViewSlot::new();
        view.unbind(&mut slot);
        view.unbind(&mut slot);
        assert!(slot.is_empty());
    }

    #[test]
    fn test_drop_detaches() {
        let view = view();
        let handle = {
            let mut slot = ViewSlot::new();
            view.bind("a", &mut slot, &ViewOptions::new()).unwrap()
        };

        assert!(!handle.is_attached());
        assert!(view.cache().contains("a"));
    }
}
