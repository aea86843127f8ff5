//! Bounded in-memory artifact cache with hit/miss accounting.
//!
//! [`ArtifactCache`] keeps entries in an insertion-ordered [`IndexMap`]. When
//! a bounded cache is full, the entry at the front of that order is evicted:
//! under [`EvictionPolicy::Fifo`] that is the oldest-inserted key, under
//! [`EvictionPolicy::Lru`] hits move a key to the back so the front is the
//! least recently used one.
//!
//! Values go in by value and come out as clones, so neither the caller's
//! copy nor a returned copy can alias the stored entry.

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which entry a full cache drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Evict the oldest-inserted key; lookups do not reorder.
    #[default]
    Fifo,
    /// Evict the least recently inserted-or-read key.
    Lru,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(EvictionPolicy::Fifo),
            "lru" => Ok(EvictionPolicy::Lru),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Fifo => f.write_str("fifo"),
            EvictionPolicy::Lru => f.write_str("lru"),
        }
    }
}

/// Counters for one cache instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0.0 before the first lookup.
    pub hit_rate: f64,
    pub size: usize,
    /// `None` for unbounded caches.
    pub capacity: Option<usize>,
}

/// Key/value store for derived artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactCache<K, V> {
    /// Name used in log output.
    name: &'static str,
    entries: IndexMap<K, V>,
    capacity: Option<usize>,
    policy: EvictionPolicy,
    hits: u64,
    misses: u64,
}

impl<K, V> ArtifactCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero disables storage entirely.
    pub fn bounded(name: &'static str, capacity: usize, policy: EvictionPolicy) -> Self {
        ArtifactCache {
            name,
            entries: IndexMap::with_capacity(capacity),
            capacity: Some(capacity),
            policy,
            hits: 0,
            misses: 0,
        }
    }

    /// Creates a cache that never evicts.
    pub fn unbounded(name: &'static str) -> Self {
        ArtifactCache {
            name,
            entries: IndexMap::new(),
            capacity: None,
            policy: EvictionPolicy::Fifo,
            hits: 0,
            misses: 0,
        }
    }

    /// The name given at construction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up `key`, returning a copy of the stored value.
    ///
    /// Every call counts as a hit or a miss. Under LRU a hit promotes the key.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let value = match self.policy {
            EvictionPolicy::Fifo => self.entries.get(key).cloned(),
            EvictionPolicy::Lru => match self.entries.shift_remove_entry(key) {
                Some((k, v)) => {
                    let out = v.clone();
                    self.entries.insert(k, v);
                    Some(out)
                }
                None => None,
            },
        };
        if value.is_some() {
            self.hits += 1;
            tracing::debug!(cache = self.name, ?key, "cache hit");
        } else {
            self.misses += 1;
            tracing::debug!(cache = self.name, ?key, "cache miss");
        }
        value
    }

    /// Looks up `key` without touching counters or order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Returns `true` if `key` is stored. Does not count as a lookup.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `value` under `key`.
    ///
    /// Replacing an existing key never evicts. Otherwise, if the cache is
    /// full, exactly one entry is evicted first. Returns the evicted key.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        if self.capacity == Some(0) {
            return None;
        }
        if self.entries.contains_key(&key) {
            match self.policy {
                EvictionPolicy::Fifo => {
                    self.entries.insert(key, value);
                }
                EvictionPolicy::Lru => {
                    self.entries.shift_remove(&key);
                    self.entries.insert(key, value);
                }
            }
            return None;
        }

        let mut evicted = None;
        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity {
                if let Some((old, _)) = self.entries.shift_remove_index(0) {
                    tracing::debug!(cache = self.name, key = ?old, "evicted");
                    evicted = Some(old);
                }
            }
        }
        self.entries.insert(key, value);
        evicted
    }

    /// Removes one entry. Returns `true` if it existed.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    /// Removes every entry. Counters are kept.
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(cache = self.name, dropped = self.entries.len(), "invalidated");
        }
        self.entries.clear();
    }

    /// Current counters and size.
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
            size: self.entries.len(),
            capacity: self.capacity,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum entry count, `None` if unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// The configured eviction policy.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Stored keys from next-to-evict to most recent.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }
}
