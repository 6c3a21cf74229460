//! ember - Ordered In-Memory Store
//! Maps keys to entries and keeps keys in lexicographic byte order.
//!
//! Expiry is observed lazily at read time: an expired entry stays in
//! the map until it is deleted or overwritten. Only the read paths
//! (`get`, `range`, `remaining_ttl`) filter expired entries.

use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, Utc};

use crate::types::{Entry, Key, Ttl, Value};

/// Ordered key-value store with lazy expiry.
/// Backed by a `BTreeMap`, which keeps keys strictly ascending by byte
/// comparison and gives O(log n) point lookups and range seeks.
#[derive(Debug, Default)]
pub struct Store {
    entries: BTreeMap<Key, Entry>,
}

impl Store {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of entries, including lazily-expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a live entry. Returns `None` if the key is absent or
    /// expired as of `now`.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<&Entry> {
        self.entries.get(key).filter(|entry| !entry.is_expired(now))
    }

    /// Look up an entry ignoring expiry.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Upsert a value. Overwriting replaces the previous expiry.
    pub fn set(&mut self, key: Key, value: Value, expires_at: Option<DateTime<Utc>>) {
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Remove a key. Returns whether it was present, ignoring expiry.
    pub fn del(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Update the expiry on an existing key.
    /// Returns false without touching anything if the key is absent.
    pub fn set_expiry(&mut self, key: &str, expires_at: Option<DateTime<Utc>>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = expires_at;
                true
            }
            None => false,
        }
    }

    /// Remaining time-to-live of a key as of `now`.
    pub fn remaining_ttl(&self, key: &str, now: DateTime<Utc>) -> Ttl {
        let Some(entry) = self.entries.get(key) else {
            return Ttl::NoKey;
        };
        match entry.expires_at {
            None => Ttl::NoTtl,
            Some(at) if at <= now => Ttl::NoKey,
            Some(at) => Ttl::Millis((at - now).num_milliseconds().max(0)),
        }
    }

    /// Every live key `k` with `start <= k <= end`, ascending.
    /// A `None` bound is unbounded on that side.
    pub fn range(&self, start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Vec<Key> {
        if let (Some(lo), Some(hi)) = (start, end) {
            // BTreeMap::range panics on an inverted bound pair.
            if lo > hi {
                return Vec::new();
            }
        }
        let lower = start.map_or(Bound::Unbounded, Bound::Included);
        let upper = end.map_or(Bound::Unbounded, Bound::Included);
        self.entries
            .range::<str, _>((lower, upper))
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }
}
