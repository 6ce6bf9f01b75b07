//! Bounded, cost-aware TTL cache shared by the resolver and the compiler.
//!
//! # Thread Safety
//!
//! All state lives behind one [`parking_lot::Mutex`], so lookups, inserts and
//! evictions are linearizable. Values are only published once fully computed;
//! a reader either sees a complete value or a miss.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::logging::targets;

/// Counters describing cache behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed for cost pressure or expiry.
    pub evictions: u64,
    pub entries: usize,
    pub total_cost: usize,
}

impl CacheStats {
    /// Hits divided by lookups, or `0.0` before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

struct CacheEntry<V> {
    value: V,
    cost: usize,
    inserted_at: Instant,
    last_access: u64,
}

struct CacheInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    total_cost: usize,
    /// Logical clock for least-recently-used ordering.
    tick: u64,
}

impl<K: Eq + Hash, V> CacheInner<K, V> {
    fn remove(&mut self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.total_cost -= entry.cost;
                true
            }
            None => false,
        }
    }
}

/// A TTL cache bounded by the summed cost of its entries.
///
/// When an insert would exceed the budget, least recently used entries are
/// evicted first. An entry whose cost alone exceeds the budget is not stored.
pub struct TtlCache<K, V> {
    config: CacheConfig,
    inner: Mutex<CacheInner<K, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                total_cost: 0,
                tick: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a live entry.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_valid(key, |_| true)
    }

    /// Look up a live entry that also passes `is_valid`.
    ///
    /// Entries failing the check are dropped and reported as a miss, so the
    /// caller recomputes and republishes them.
    pub fn get_valid(&self, key: &K, is_valid: impl FnOnce(&V) -> bool) -> Option<V> {
        if !self.config.enabled {
            return None;
        }

        let ttl = self.config.ttl();
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;

        let verdict = match inner.entries.get_mut(key) {
            None => None,
            Some(entry) => {
                if entry.inserted_at.elapsed() >= ttl || !is_valid(&entry.value) {
                    Some(false)
                } else {
                    entry.last_access = tick;
                    Some(true)
                }
            }
        };

        match verdict {
            Some(true) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                inner.entries.get(key).map(|e| e.value.clone())
            }
            Some(false) => {
                inner.remove(key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(target: targets::CACHE, "dropped stale or invalid entry");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Publish a fully computed value with the given cost.
    ///
    /// Returns `false` if the value was not stored.
    pub fn insert(&self, key: K, value: V, cost: usize) -> bool {
        if !self.config.enabled || cost > self.config.max_cost {
            return false;
        }

        let mut inner = self.inner.lock();
        inner.remove(&key);

        let mut evicted = 0u64;
        while inner.total_cost + cost > self.config.max_cost {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(k, _)| k.clone());
            match victim {
                Some(victim) => {
                    inner.remove(&victim);
                    evicted += 1;
                }
                None => break,
            }
        }
        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
            tracing::debug!(target: targets::CACHE, evicted, "evicted entries for cost");
        }

        inner.tick += 1;
        let tick = inner.tick;
        inner.total_cost += cost;
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                cost,
                inserted_at: Instant::now(),
                last_access: tick,
            },
        );
        true
    }

    /// Remove one entry.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.lock().remove(key)
    }

    /// Remove every entry whose key matches `predicate`. Returns the count.
    pub fn remove_where(&self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let mut inner = self.inner.lock();
        let doomed: Vec<K> = inner.entries.keys().filter(|k| predicate(k)).cloned().collect();
        for key in &doomed {
            inner.remove(key);
        }
        doomed.len()
    }

    /// Remove everything.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_cost = 0;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: inner.entries.len(),
            total_cost: inner.total_cost,
        }
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
