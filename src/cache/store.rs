//! TTL Cache Module
//!
//! Generic key-value store with per-entry expiry and an optional size bound
//! enforced by evicting the oldest inserted entry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, InsertionOrder};

// == TTL Cache ==
/// Key-value store whose entries expire a fixed `ttl` after being set.
///
/// Not internally synchronized; callers share it behind a lock.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Insertion order used for eviction
    order: InsertionOrder<K>,
    /// Lifetime of every entry
    ttl: Duration,
    /// Maximum number of entries, unbounded when None
    max_entries: Option<usize>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache with the given entry lifetime and optional capacity.
    pub fn new(ttl: Duration, max_entries: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            ttl,
            max_entries,
        }
    }

    // == Set ==
    /// Stores a value, resetting its expiry.
    ///
    /// If the key is new and the cache is at capacity, the oldest inserted
    /// entry is evicted first. Overwriting keeps the key's original position.
    /// Returns the evicted key, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<K> {
        self.set_at(key, value, Instant::now())
    }

    pub(crate) fn set_at(&mut self, key: K, value: V, now: Instant) -> Option<K> {
        let mut evicted = None;

        if !self.entries.contains_key(&key) {
            if let Some(max) = self.max_entries {
                if self.entries.len() >= max {
                    if let Some(oldest) = self.order.pop_oldest() {
                        self.entries.remove(&oldest);
                        evicted = Some(oldest);
                    }
                }
            }
            self.order.push(key.clone());
        }

        self.entries
            .insert(key, CacheEntry::new(value, self.ttl, now));
        evicted
    }

    // == Get ==
    /// Returns the value if present and unexpired.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.entries.remove(key);
            self.order.remove(key);
            return None;
        }

        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Invalidate ==
    /// Removes a single key. Returns true if it was present.
    pub fn invalidate(&mut self, key: &K) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Empties the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub(crate) fn cleanup_expired_at(&mut self, now: Instant) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }

        expired_keys.len()
    }

    // == Length ==
    /// Returns the current number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
