//! Cache configuration types
//!
//! This module contains the tuning knobs for the resource cache:
//! - `CacheConfig` - Page size and full-screen lookahead that together size the cache
//! - `CacheConfigBuilder` - Fluent construction
//! - `EnvSource` - Abstraction over the process environment for overrides

mod env;
mod types;

pub use env::{DefaultEnvSource, EnvSource};
pub use types::{
    CacheConfig, CacheConfigBuilder, DEFAULT_PAGE_SIZE, DEFAULT_PREFETCH_COUNT, MAX_CAPACITY,
};
