//! Byte-budgeted LRU store for cached HTTP responses.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use lru::LruCache;
use tracing::debug;

use super::CacheConfig;

// =============================================================================
// Cached Response
// =============================================================================

/// Snapshot of a successful response: its headers and full body.
///
/// Only 200 responses are ever admitted, so the status is implied.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    headers: HeaderMap,
    body: Bytes,
}

impl CachedResponse {
    pub fn new(headers: HeaderMap, body: Bytes) -> Self {
        Self { headers, body }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Size charged against the cache budgets (body bytes).
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Rebuild an HTTP response replaying the stored headers and body.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = StatusCode::OK;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

// =============================================================================
// Admission
// =============================================================================

/// Outcome of offering a response to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The entry was stored
    Admitted,

    /// The entry is larger than the per-entry limit
    EntryTooLarge,

    /// The entry does not fit the total budget even with the cache emptied
    ExceedsTotal,
}

// =============================================================================
// Response Cache
// =============================================================================

struct Entry {
    response: Arc<CachedResponse>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

struct Inner {
    entries: LruCache<String, Entry>,

    /// Sum of the sizes of all entries
    size: usize,
}

impl Inner {
    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.pop(key)?;
        self.size = self.size.saturating_sub(entry.response.size());
        Some(entry)
    }
}

/// LRU cache of response snapshots bounded by a total byte budget.
///
/// The entry map, the recency order and the byte counter live under one
/// mutex, so the "fits" check, eviction and insertion form a single critical
/// section. The lock is never held across an `.await`.
///
/// # Invariants
///
/// - The sum of entry sizes never exceeds the total limit (when non-zero).
/// - No entry is larger than the per-entry limit (when non-zero).
pub struct ResponseCache {
    inner: Mutex<Inner>,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                size: 0,
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the counter and the map
        // out of step: every mutation updates both before returning.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a response and mark it as most recently used.
    ///
    /// Expired entries are dropped and reported as misses.
    pub fn get(&self, key: &str) -> Option<Arc<CachedResponse>> {
        let mut inner = self.lock();

        let expired = inner.entries.peek(key)?.is_expired(Instant::now());
        if expired {
            inner.remove(key);
            debug!(key = key, "Dropped expired cache entry");
            return None;
        }

        inner
            .entries
            .get(key)
            .map(|entry| Arc::clone(&entry.response))
    }

    /// Check for a live entry without updating recency.
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.lock();
        inner
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(Instant::now()))
    }

    /// Offer a response to the cache.
    ///
    /// An existing entry under `key` is replaced. When the total budget would
    /// be exceeded, least-recently-used entries are evicted until the new
    /// entry fits or the cache is empty; if it still does not fit, it is not
    /// stored.
    pub fn insert(&self, key: impl Into<String>, response: CachedResponse) -> Admission {
        let key = key.into();
        let size = response.size();

        if self.config.entry_limit > 0 && size > self.config.entry_limit {
            return Admission::EntryTooLarge;
        }

        let mut inner = self.lock();
        inner.remove(&key);

        let total_limit = self.config.total_limit;
        if total_limit > 0 {
            while inner.size + size > total_limit {
                match inner.entries.pop_lru() {
                    Some((evicted_key, evicted)) => {
                        inner.size = inner.size.saturating_sub(evicted.response.size());
                        debug!(key = %evicted_key, bytes = evicted.response.size(), "Evicted cache entry");
                    }
                    None => break,
                }
            }

            if inner.size + size > total_limit {
                return Admission::ExceedsTotal;
            }
        }

        let entry = Entry {
            response: Arc::new(response),
            expires_at: self.config.ttl.map(|ttl| Instant::now() + ttl),
        };
        inner.entries.put(key, entry);
        inner.size += size;

        Admission::Admitted
    }

    /// Remove an entry, returning its snapshot if it was present.
    pub fn remove(&self, key: &str) -> Option<Arc<CachedResponse>> {
        self.lock().remove(key).map(|entry| entry.response)
    }

    /// Drop every entry whose TTL has elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();

        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.remove(key);
        }
        expired.len()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.size = 0;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Total bytes currently held.
    pub fn size(&self) -> usize {
        self.lock().size
    }

    /// Per-entry limit in bytes (0 = unlimited).
    pub fn entry_limit(&self) -> usize {
        self.config.entry_limit
    }

    /// Total budget in bytes (0 = unlimited).
    pub fn total_limit(&self) -> usize {
        self.config.total_limit
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.config.ttl
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
