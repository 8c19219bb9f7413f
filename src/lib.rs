//! # thumbcache - shared image resource cache for scrolling galleries
//!
//! A bounded, least-recently-used cache of image resources keyed by locator,
//! plus a small adapter that binds cached resources into view slots as views
//! mount and unmount.
//!
//! Views come and go as a gallery scrolls. Without a shared cache every
//! remount would fetch and decode its image again. With one, a view bound to
//! a locator that is still cached gets the very same resource back, already
//! loaded.
//!
//! ## Features
//!
//! - **Bounded LRU**: capacity is `page_size + prefetch_count`, the least
//!   recently used entry is evicted on overflow
//! - **Identity**: at most one resource per locator; repeated requests return
//!   the same handle
//! - **Peek without side effects**: `should_create = false` never allocates
//! - **Host-driven loading**: a [`ResourceLoader`] receives a [`LoadTicket`]
//!   per new resource and finishes it when the image is decoded
//! - **Cancellation**: loads of resources dropped before they finish are
//!   cancelled
//! - **Events and stats**: observe creations, hits, evictions and clears
//!
//! ## Quick Start
//!
//! ```rust
//! use thumbcache::{CacheBoundView, LoadTicket, ResourceCache, ViewOptions, ViewSlot};
//!
//! let cache = ResourceCache::builder()
//!     .page_size(8)
//!     .prefetch_count(3)
//!     .with_loader(|ticket: LoadTicket| {
//!         // Start the fetch; finish the ticket once the image is decoded
//!         ticket.complete(vec![0u8; 4]);
//!     })
//!     .build_shared()
//!     .unwrap();
//!
//! let view = CacheBoundView::new(cache.clone());
//! let mut slot = ViewSlot::new();
//!
//! let handle = view
//!     .bind(
//!         "https://photos/42.jpg",
//!         &mut slot,
//!         &ViewOptions::new().alt_text("Lighthouse").class_name("thumb"),
//!     )
//!     .unwrap();
//!
//! assert!(handle.is_ready());
//! assert!(slot.is_holding());
//! ```
//!
//! ## Configuration
//!
//! Sizing comes from a [`CacheConfig`], built in code, read from the
//! environment or from a JSON (or, with the `toml` feature, TOML) file:
//!
//! ```rust
//! use std::collections::HashMap;
//! use thumbcache::CacheConfig;
//!
//! let env = HashMap::from([("GALLERY_PAGE_SIZE".to_string(), "12".to_string())]);
//! let config = CacheConfig::from_env("GALLERY", &env).unwrap();
//! assert_eq!(config.capacity(), 15);
//! ```

mod cache;
pub mod config;
mod error;
mod events;
mod lifecycle;
mod loader;
mod resource;
mod sync;
mod view;

pub use cache::{CacheStats, ResourceCache, ResourceCacheBuilder};
pub use config::{CacheConfig, CacheConfigBuilder, DefaultEnvSource, EnvSource};
pub use error::{Error, Result};
pub use events::{CacheEvent, EventCallback, EventManager};
pub use lifecycle::CacheScope;
pub use loader::{CancellationToken, ImmediateLoader, LoadTicket, ResourceLoader};
pub use resource::{Readiness, ReadyCallback, ResourceAttributes, ResourceHandle};
pub use view::{CacheBoundView, SlotId, ViewOptions, ViewSlot};
