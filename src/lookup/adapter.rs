//! Lookup adapter for one record kind.
//!
//! Readers take a snapshot of the current cache state (one `Arc` clone under a
//! read lock) and never hold a lock across the remote fetch. Reconfiguration
//! reloads the local table every time and swaps in a fresh cache only when the
//! remote URL, cache size or TTL changed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use super::cache::BoundedCache;
use super::local::LocalTable;
use super::remote::{RemoteFetcher, UrlTemplate};
use crate::config::LookupConfig;
use crate::metrics::{LookupSource, LookupStats, StatsSnapshot};
use crate::record::Record;

/// Outcome of a reconfiguration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconfigured {
    /// No configuration was available; nothing changed.
    NoConfig,
    /// Local table reloaded, cache parameters unchanged so the warm cache stays.
    CacheKept,
    /// Local table reloaded and a fresh cache swapped in.
    CacheReplaced,
}

/// Parameters whose change forces a new cache.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheParams {
    remote: Option<UrlTemplate>,
    max_entries: usize,
    ttl: Duration,
}

struct LookupState<R> {
    cache: Arc<BoundedCache<R>>,
    params: CacheParams,
}

impl<R: Record> LookupState<R> {
    fn build(params: CacheParams) -> Self {
        Self {
            cache: Arc::new(BoundedCache::new(params.max_entries, params.ttl)),
            params,
        }
    }
}

pub struct LookupAdapter<R: Record> {
    state: RwLock<Arc<LookupState<R>>>,
    local: LocalTable<R>,
    fetcher: RemoteFetcher,
    /// Serialises reconfigurations; readers never touch it.
    reconfigure_lock: Mutex<()>,
    stats: LookupStats,
}

impl<R: Record> LookupAdapter<R> {
    /// Adapter with no remote source, no cache and an empty local table.
    pub fn new(fetcher: RemoteFetcher) -> Self {
        let params = CacheParams {
            remote: None,
            max_entries: 0,
            ttl: Duration::ZERO,
        };
        Self {
            state: RwLock::new(Arc::new(LookupState::build(params))),
            local: LocalTable::new(),
            fetcher,
            reconfigure_lock: Mutex::new(()),
            stats: LookupStats::new(),
        }
    }

    fn snapshot(&self) -> Arc<LookupState<R>> {
        Arc::clone(&*self.state.read())
    }

    /// Resolve `id` through cache, local table and remote source, in that order.
    /// Any hit below the cache is written back into the cache snapshot taken at entry.
    pub async fn get(&self, id: &str) -> Option<R> {
        let state = self.snapshot();

        if let Some(record) = state.cache.get(id) {
            trace!(kind = R::KIND, id, "cache hit");
            self.stats.record_hit(LookupSource::Cache);
            return Some(record);
        }

        debug!(kind = R::KIND, id, "getting data from local config");
        let found = match self.local.lookup(id) {
            Some(record) => {
                trace!(kind = R::KIND, id, "found data in local config");
                self.stats.record_hit(LookupSource::Local);
                Some(record)
            }
            None => {
                trace!(kind = R::KIND, id, "data not found in local config");
                self.fetch_remote(&state, id).await
            }
        };

        match found {
            Some(record) => {
                state.cache.put(id, record.clone());
                debug!(kind = R::KIND, id, "returning record");
                Some(record)
            }
            None => {
                self.stats.record_miss();
                debug!(kind = R::KIND, id, "data not found");
                None
            }
        }
    }

    async fn fetch_remote(&self, state: &LookupState<R>, id: &str) -> Option<R> {
        let template = state.params.remote.as_ref()?;

        let started = Instant::now();
        let result = self.fetcher.fetch::<R>(template, id).await;
        self.stats.record_remote_latency(started.elapsed());

        match result {
            Ok(record) => {
                self.stats.record_hit(LookupSource::Remote);
                Some(record)
            }
            Err(e) => {
                self.stats.record_remote_failure();
                debug!(kind = R::KIND, id, error = %e, "exception while reading remote data");
                None
            }
        }
    }

    /// Cache-only lookup; never consults the local table or the remote source.
    pub fn get_from_cache(&self, id: &str) -> Option<R> {
        self.snapshot().cache.get(id)
    }

    pub fn invalidate_id(&self, id: &str) {
        self.snapshot().cache.invalidate(id);
    }

    pub fn invalidate_all(&self) {
        self.snapshot().cache.invalidate_all();
    }

    /// Empty the local table. Cache and remote source are untouched.
    pub fn clear_local_data(&self) {
        self.local.clear();
        info!(kind = R::KIND, "local data cleared");
    }

    /// Apply a configuration if one is available; otherwise keep the current state.
    pub fn update_config(&self, config: Option<LookupConfig<R>>) -> Reconfigured {
        match config {
            Some(config) => self.reconfigure(config),
            None => {
                warn!(kind = R::KIND, "configuration not available");
                Reconfigured::NoConfig
            }
        }
    }

    /// Reload the local table and, if the cache parameters changed, swap in a new cache.
    pub fn reconfigure(&self, config: LookupConfig<R>) -> Reconfigured {
        let _guard = self.reconfigure_lock.lock();

        let LookupConfig {
            remote,
            cache_max_entries,
            cache_ttl,
            local_entries,
        } = config;
        let params = CacheParams {
            remote,
            max_entries: cache_max_entries,
            ttl: cache_ttl,
        };

        info!(
            kind = R::KIND,
            max_entries = params.max_entries,
            ttl_secs = params.ttl.as_secs(),
            entries = local_entries.len(),
            url = params.remote.as_ref().map(UrlTemplate::as_str).unwrap_or("none"),
            "applying configuration"
        );
        self.local.load(local_entries);

        if self.snapshot().params == params {
            debug!(kind = R::KIND, "cache parameters unchanged, keeping cache");
            return Reconfigured::CacheKept;
        }

        let fresh = Arc::new(LookupState::build(params));
        let old = std::mem::replace(&mut *self.state.write(), fresh);
        // Readers still holding the old snapshot finish against a detached, empty cache.
        old.cache.invalidate_all();
        self.stats.record_cache_replacement();
        info!(kind = R::KIND, "cache rebuilt");
        Reconfigured::CacheReplaced
    }

    pub fn cache_len(&self) -> usize {
        self.snapshot().cache.len()
    }

    pub fn local_len(&self) -> usize {
        self.local.len()
    }

    pub fn remote_template(&self) -> Option<UrlTemplate> {
        self.snapshot().params.remote.clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn cache_handle(&self) -> Arc<BoundedCache<R>> {
        Arc::clone(&self.snapshot().cache)
    }
}
