//! Size- and TTL-bounded record cache.
//! LRU eviction on insert, expiry measured from the last access.
//! Capacity 0 or TTL 0 disables retention entirely.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

struct CacheEntry<R> {
    record: R,
    last_access: Instant,
}

pub struct BoundedCache<R> {
    inner: Option<Mutex<LruCache<String, CacheEntry<R>>>>,
    capacity: usize,
    ttl: Duration,
}

impl<R: Clone> BoundedCache<R> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let inner = match NonZeroUsize::new(capacity) {
            Some(cap) if !ttl.is_zero() => Some(Mutex::new(LruCache::new(cap))),
            _ => None,
        };
        Self { inner, capacity, ttl }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a record, refreshing its access time. Expired entries are dropped.
    pub fn get(&self, id: &str) -> Option<R> {
        self.get_at(id, Instant::now())
    }

    pub(crate) fn get_at(&self, id: &str, now: Instant) -> Option<R> {
        let mut cache = self.inner.as_ref()?.lock();
        let entry = cache.get_mut(id)?;
        if now.saturating_duration_since(entry.last_access) > self.ttl {
            cache.pop(id);
            return None;
        }
        entry.last_access = now;
        Some(entry.record.clone())
    }

    /// Insert or overwrite. At capacity the least recently accessed entry goes.
    pub fn put(&self, id: &str, record: R) {
        self.put_at(id, record, Instant::now());
    }

    pub(crate) fn put_at(&self, id: &str, record: R, now: Instant) {
        if let Some(inner) = &self.inner {
            inner.lock().put(
                id.to_owned(),
                CacheEntry {
                    record,
                    last_access: now,
                },
            );
        }
    }

    pub fn invalidate(&self, id: &str) {
        if let Some(inner) = &self.inner {
            inner.lock().pop(id);
        }
    }

    pub fn invalidate_all(&self) {
        if let Some(inner) = &self.inner {
            inner.lock().clear();
        }
    }

    /// Number of stored entries, including ones that have expired but not yet been touched.
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, |inner| inner.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
