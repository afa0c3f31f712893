// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Cache store trait and the in-memory TTL implementation.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Get/set access to a cache with per-entry time-to-live.
///
/// An entry read after its TTL has elapsed behaves exactly like a key that
/// was never set.
pub trait CacheStore<V>: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: V, ttl: Duration);

    /// Value under `key` if present and not expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Drop the entry under `key`.
    fn remove(&self, key: &str);
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    /// `None` when the TTL reaches past the clock's range.
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// In-memory cache; expired entries are dropped lazily on read or by
/// [`purge_expired`](TtlCache::purge_expired).
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    default_ttl: Duration,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Create a cache whose [`set_default`](Self::set_default) uses `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` with the cache's default TTL.
    pub fn set_default(&self, key: &str, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Remove all expired entries and return how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone + Send + Sync> CacheStore<V> for TtlCache<V> {
    fn set(&self, key: &str, value: V, ttl: Duration) {
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        debug!(key, ttl_ms = ttl.as_millis() as u64, "Added entry to cache");
    }

    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let hit = self
            .entries
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match hit {
            Some(Some(value)) => Some(value),
            Some(None) => {
                self.entries.remove_if(key, |_, entry| !entry.is_live(now));
                debug!(key, "Cache entry expired");
                None
            }
            None => {
                warn!(key, "Entry not found in cache");
                None
            }
        }
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
