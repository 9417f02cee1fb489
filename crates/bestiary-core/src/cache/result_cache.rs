//! Shared TTL cache backed by moka
//!
//! Entries carry the TTL of the operation that produced them; a custom
//! `Expiry` turns that into a per-entry deadline. Expiry is checked when an
//! entry is read, and moka's housekeeping reclaims expired or evicted entries
//! in the background of later calls.
//!
//! Concurrent misses on one key are coalesced: the first caller computes,
//! the others wait for its result. Failed computations are never stored.

use crate::config::CacheConfig;
use crate::{Result, StoreError};
use dashmap::DashMap;
use moka::future::Cache;
use moka::Expiry;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Type-erased cached value plus the TTL it was stored with
#[derive(Clone)]
pub(crate) struct CachedValue {
    value: Arc<dyn Any + Send + Sync>,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Hit/miss counters for one wrapped operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    pub hits: u64,
    pub misses: u64,
}

impl OperationStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Snapshot of cache usage
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entries: u64,
    /// Sorted by operation name
    pub operations: Vec<(String, OperationStats)>,
}

impl CacheStats {
    pub fn operation(&self, name: &str) -> OperationStats {
        self.operations
            .iter()
            .find(|(op, _)| op == name)
            .map(|(_, stats)| *stats)
            .unwrap_or_default()
    }

    pub fn total_hits(&self) -> u64 {
        self.operations.iter().map(|(_, s)| s.hits).sum()
    }

    pub fn total_misses(&self) -> u64 {
        self.operations.iter().map(|(_, s)| s.misses).sum()
    }
}

/// Process-local result cache (cheap to clone, clones share state)
#[derive(Clone)]
pub struct ResultCache {
    entries: Cache<String, CachedValue>,
    counters: Arc<DashMap<String, OperationStats>>,
    enabled: bool,
}

impl ResultCache {
    /// Create a cache holding at most `max_entries` results
    pub fn new(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            entries,
            counters: Arc::new(DashMap::new()),
            enabled: true,
        }
    }

    /// A cache that never stores anything; every call computes
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0)
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        if config.enabled {
            Self::new(config.max_entries)
        } else {
            Self::disabled()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the live value under `key`, or run `init` and store its result.
    ///
    /// `operation` only labels the hit/miss counters. An `Err` from `init`
    /// is returned to every waiter and nothing is stored.
    pub async fn get_or_try_insert<T, F>(
        &self,
        operation: &str,
        key: String,
        ttl: Duration,
        init: F,
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Future<Output = Result<T>>,
    {
        if !self.enabled {
            self.record(operation, false);
            return init.await;
        }

        let entry = self
            .entries
            .entry(key.clone())
            .or_try_insert_with(async move {
                let value = init.await?;
                Ok::<_, StoreError>(CachedValue {
                    value: Arc::new(value),
                    ttl,
                })
            })
            .await
            .map_err(|e| (*e).clone())?;

        let hit = !entry.is_fresh();
        self.record(operation, hit);
        if hit {
            debug!(key = %key, "Cache hit");
        } else {
            debug!(key = %key, ttl_secs = ttl.as_secs_f64(), "Cache miss, stored result");
        }

        entry
            .into_value()
            .value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(StoreError::CacheTypeMismatch { key })
    }

    fn record(&self, operation: &str, hit: bool) {
        let mut stats = self.counters.entry(operation.to_string()).or_default();
        if hit {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
    }

    /// Check whether a live entry exists without touching counters
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.get(key).await.is_some()
    }

    /// Drop every entry (counters are kept)
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        debug!("Result cache cleared");
    }

    /// Current usage; runs pending housekeeping first so counts are exact
    pub async fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks().await;

        let mut operations: Vec<_> = self
            .counters
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        operations.sort_by(|a, b| a.0.cmp(&b.0));

        CacheStats {
            entries: self.entries.entry_count(),
            operations,
        }
    }

    /// Clear entries and flush housekeeping at process shutdown
    pub async fn shutdown(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        debug!("Result cache shut down");
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
