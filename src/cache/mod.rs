//! In-memory HTTP response cache.
//!
//! The cache sits in front of the tileset handlers as an axum middleware and
//! memoizes complete `200 OK` responses, keyed by request URI.
//!
//! # Request flow
//!
//! ```text
//!  request ──► cache_key ──► ResponseCache::get ──hit──► replay headers + body
//!                                   │
//!                                  miss
//!                                   ▼
//!                          downstream handler
//!                                   │
//!                                   ▼
//!            TeeBody ──► client
//!               │
//!               └──► SizeLimiter ──► Recorder
//!                                      │
//!                 body complete, 200, within limits
//!                                      ▼
//!                          ResponseCache::insert
//! ```
//!
//! # Budgets
//!
//! Two byte budgets apply, each disabled when zero:
//!
//! - the **per-entry limit**: a response whose body is larger is served but
//!   never stored;
//! - the **total limit**: least-recently-used entries are evicted to make
//!   room, and an entry that cannot fit even in an empty cache is skipped.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use axum::http::HeaderMap;
//! use cesium_terrain_server::cache::{Admission, CacheConfig, CachedResponse, ResponseCache};
//!
//! let cache = ResponseCache::new(CacheConfig::new(1024, 4096));
//! let response = CachedResponse::new(HeaderMap::new(), Bytes::from_static(b"{}"));
//!
//! assert_eq!(cache.insert("/tilesets/world/layer.json", response), Admission::Admitted);
//! assert!(cache.get("/tilesets/world/layer.json").is_some());
//! ```

mod memory;
mod middleware;
mod recorder;
mod tee;

use std::time::Duration;

use crate::bytesize::MB;

pub use memory::{Admission, CachedResponse, ResponseCache};
pub use middleware::{cache_key, response_cache_middleware, CACHE_HIT_HEADER, CACHE_KEY_HEADER};
pub use recorder::{Recorder, SizeLimiter};
pub use tee::TeeBody;

/// Default per-entry limit: 1MB
pub const DEFAULT_ENTRY_LIMIT: usize = MB as usize;

/// Default total budget: 100MB
pub const DEFAULT_TOTAL_LIMIT: usize = 100 * MB as usize;

/// Budgets for the response cache. Zero disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Largest body, in bytes, a single entry may have
    pub entry_limit: usize,

    /// Bytes held across all entries
    pub total_limit: usize,

    /// Lifetime of an entry; `None` keeps entries until evicted
    pub ttl: Option<Duration>,
}

impl CacheConfig {
    pub fn new(entry_limit: usize, total_limit: usize) -> Self {
        Self {
            entry_limit,
            total_limit,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENTRY_LIMIT, DEFAULT_TOTAL_LIMIT)
    }
}
