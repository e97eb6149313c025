//! Process-local memory tier (L1).
//!
//! Fixed TTL, lazily expired: an entry older than the TTL is dropped by the
//! first read that touches it. Nothing sweeps in the background.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::time::Instant;

use crate::pattern::KeyPattern;

/// A live cached value and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Arc<Value>,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// In-process map of key to [`CacheEntry`]
#[derive(Debug)]
pub struct MemoryTier {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MemoryTier {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, evicting it if it has expired
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now, self.ttl) {
                return Some(Arc::clone(&entry.value));
            }
        }

        // Re-checked under the shard lock, a concurrent set may have refreshed it
        self.entries.remove_if(key, |_, entry| entry.is_expired(now, self.ttl));
        None
    }

    /// Store `value` with a fresh timestamp, replacing any previous entry
    pub fn insert(&self, key: impl Into<String>, value: Arc<Value>) {
        self.entries.insert(key.into(), CacheEntry { value, stored_at: Instant::now() });
    }

    /// Remove every key matching `pattern`, returning the removed keys
    pub fn invalidate(&self, pattern: &KeyPattern) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|key, _| {
            if pattern.matches(key) {
                removed.push(key.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drop every expired entry now, returning how many were dropped.
    ///
    /// Never called by the cache itself.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    /// Number of stored entries, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
