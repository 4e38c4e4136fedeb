//! Persisted, TTL'd cache of range aggregates keyed by (time range, domain).
//!
//! One JSON file holds every entry; values are replaced whole, never
//! patched. The cache also owns the per-key in-flight flags that keep two
//! concurrent requests for the same key from scraping twice.

use crate::orders::fetch::PageFetch;
use crate::orders::models::{epoch_ms, RangeAggregate, SpendingError, TimeRange};
use crate::orders::paginate::{fetch_range, PagingLimits};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Prefix of every persisted cache key.
pub const KEY_PREFIX: &str = "amz_spending_cache";

/// Persisted wrapper around one range aggregate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: RangeAggregate,
    /// Epoch milliseconds when the entry was stored.
    pub ts: u64,
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashSet<String>,
}

/// TTL'd range-aggregate cache backed by a single JSON file.
pub struct RangeCache {
    path: PathBuf,
    ttl_ms: u64,
    state: Mutex<CacheState>,
}

impl RangeCache {
    /// Opens the cache at `path`, loading any persisted entries.
    pub fn open(path: impl AsRef<Path>, ttl_ms: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Discarding unreadable cache file ({}): {}", path.display(), e);
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        debug!("Opened cache with {} entries at {}", entries.len(), path.display());

        Ok(Self {
            path,
            ttl_ms,
            state: Mutex::new(CacheState { entries, in_flight: HashSet::new() }),
        })
    }

    fn key(range: TimeRange, domain: &str) -> String {
        format!("{}_{}_{}", KEY_PREFIX, range.filter(), domain)
    }

    /// Returns the cached aggregate if still within the TTL.
    pub fn read(&self, range: TimeRange, domain: &str) -> Option<RangeAggregate> {
        self.read_at(range, domain, epoch_ms())
    }

    fn read_at(&self, range: TimeRange, domain: &str, now_ms: u64) -> Option<RangeAggregate> {
        let state = self.lock();
        let entry = state.entries.get(&Self::key(range, domain))?;
        if now_ms.saturating_sub(entry.ts) < self.ttl_ms {
            Some(entry.data)
        } else {
            None
        }
    }

    /// Replaces the entry for the key, stamping the store time.
    pub fn write(&self, range: TimeRange, domain: &str, aggregate: RangeAggregate) {
        self.write_at(range, domain, aggregate, epoch_ms());
    }

    fn write_at(&self, range: TimeRange, domain: &str, aggregate: RangeAggregate, now_ms: u64) {
        let mut state = self.lock();
        state.entries.insert(Self::key(range, domain), CacheEntry { data: aggregate, ts: now_ms });
        self.persist(&state);
    }

    /// Cache-first read with optional forced refresh and a cache-only mode
    /// that never triggers a live fetch.
    ///
    /// Returns `Ok(None)` when nothing fresh exists and no fetch was run:
    /// cache-only mode, or another fetch for the same key is already in
    /// flight (the caller retries later rather than doubling the scrape).
    ///
    /// On auth or tab-creation failure nothing is cached and the error
    /// propagates.
    pub async fn read_or_fetch(
        &self,
        range: TimeRange,
        domain: &str,
        fetcher: &dyn PageFetch,
        limits: PagingLimits,
        force_refresh: bool,
        cache_only: bool,
    ) -> Result<Option<RangeAggregate>, SpendingError> {
        let key = Self::key(range, domain);

        // Single critical section covers the freshness check and the
        // in-flight claim so two near-simultaneous callers cannot both
        // decide to fetch.
        {
            let mut state = self.lock();

            if !force_refresh {
                if let Some(entry) = state.entries.get(&key) {
                    if epoch_ms().saturating_sub(entry.ts) < self.ttl_ms {
                        debug!("Cache hit for {}", key);
                        return Ok(Some(entry.data));
                    }
                }
            }

            if cache_only {
                debug!("Cache-only miss for {}", key);
                return Ok(None);
            }

            if !state.in_flight.insert(key.clone()) {
                info!("Fetch already in flight for {}, skipping", key);
                return Ok(None);
            }
        }

        info!("Cache miss for {}, fetching live", key);
        let outcome = fetch_range(fetcher, limits).await;

        let mut state = self.lock();
        state.in_flight.remove(&key);

        match outcome {
            Ok(totals) => {
                let now = epoch_ms();
                let aggregate = totals.into_aggregate(now);
                state.entries.insert(key, CacheEntry { data: aggregate, ts: now });
                self.persist(&state);
                Ok(Some(aggregate))
            }
            Err(e) => {
                // Partial results are never cached.
                Err(e)
            }
        }
    }

    /// Returns all fresh (domain, aggregate) pairs for a time range,
    /// evicting expired entries of that range as a read side effect.
    pub fn entries_for_range(&self, range: TimeRange) -> Vec<(String, RangeAggregate)> {
        self.entries_for_range_at(range, epoch_ms())
    }

    fn entries_for_range_at(
        &self,
        range: TimeRange,
        now_ms: u64,
    ) -> Vec<(String, RangeAggregate)> {
        let prefix = format!("{}_{}_", KEY_PREFIX, range.filter());
        let mut state = self.lock();

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(key, entry)| {
                key.starts_with(&prefix) && now_ms.saturating_sub(entry.ts) >= self.ttl_ms
            })
            .map(|(key, _)| key.clone())
            .collect();

        if !expired.is_empty() {
            debug!("Evicting {} expired cache entries", expired.len());
            for key in &expired {
                state.entries.remove(key);
            }
            self.persist(&state);
        }

        let mut fresh: Vec<(String, RangeAggregate)> = state
            .entries
            .iter()
            .filter_map(|(key, entry)| {
                let domain = key.strip_prefix(&prefix)?;
                Some((domain.to_string(), entry.data))
            })
            .collect();

        fresh.sort_by(|a, b| a.0.cmp(&b.0));
        fresh
    }

    /// Removes every entry and persists the empty store.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        self.persist(&state);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes the store to disk. Persistence failures degrade to a warning:
    /// a missing cache file only costs a re-fetch later.
    fn persist(&self, state: &CacheState) {
        if let Err(e) = self.try_persist(state) {
            warn!("Failed to persist cache: {:#}", e);
        }
    }

    fn try_persist(&self, state: &CacheState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string(&state.entries).context("Failed to encode cache")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))
    }
}
