//! In-process [`KeyValueStore`] with store-side expiry.
//!
//! Behaves like the distributed store as far as the cache can tell: values
//! expire on their own after the TTL given at write time. Clones share the
//! same data, so two services built over clones of one store see each other's
//! writes the way two processes sharing Redis would.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{KeyValueStore, effective_ttl};
use crate::error::{CacheError, Result};
use crate::pattern::KeyPattern;

// Stand-in expiry for TTLs past what `Instant` can represent
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug)]
struct StoredValue {
    payload: String,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Shared {
    values: DashMap<String, StoredValue>,
    failing: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Shared in-memory key/value store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Shared>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `get` calls received
    #[must_use]
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls received
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Whether an unexpired value is stored under `key`
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.inner.values.get(key).is_some_and(|v| v.expires_at > now)
    }

    /// Store a raw payload directly, bypassing the codec.
    ///
    /// `ttl` goes through [`effective_ttl`] like every store write.
    pub fn insert_raw(&self, key: impl Into<String>, payload: impl Into<String>, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now.checked_add(effective_ttl(ttl)).unwrap_or_else(|| now + FAR_FUTURE);
        self.inner
            .values
            .insert(key.into(), StoredValue { payload: payload.into(), expires_at });
    }

    fn check(&self) -> Result<()> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(CacheError::Store("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let now = Instant::now();
        if let Some(value) = self.inner.values.get(key) {
            if value.expires_at > now {
                return Ok(Some(value.payload.clone()));
            }
        }
        self.inner.values.remove_if(key, |_, v| v.expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.insert_raw(key, payload, ttl);
        Ok(())
    }

    async fn find_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>> {
        self.check()?;
        let now = Instant::now();
        Ok(self
            .inner
            .values
            .iter()
            .filter(|entry| entry.expires_at > now && pattern.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        self.check()?;
        let now = Instant::now();
        Ok(keys
            .iter()
            .filter_map(|key| self.inner.values.remove(key))
            .filter(|(_, value)| value.expires_at > now)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_store_side_expiry() {
        let store = InMemoryStore::new();
        store.set("k", "v", Duration::from_secs(300)).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_find_and_delete() {
        let store = InMemoryStore::new();
        for key in ["bootstrap:T1", "bootstrap:T2", "other:X"] {
            store.set(key, "v", Duration::from_secs(300)).await.unwrap();
        }

        let mut keys = store.find_keys(&KeyPattern::new("bootstrap:*")).await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["bootstrap:T1", "bootstrap:T2"]);

        assert_eq!(store.delete(&keys).await.unwrap(), 2);
        assert_eq!(store.delete(&keys).await.unwrap(), 0);
        assert!(store.contains("other:X"));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryStore::new();
        store.set_failing(true);

        assert!(matches!(store.get("k").await, Err(CacheError::Store(_))));
        assert!(store.set("k", "v", Duration::from_secs(1)).await.is_err());
        assert!(store.find_keys(&KeyPattern::new("*")).await.is_err());

        store.set_failing(false);
        store.set("k", "v", Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let a = InMemoryStore::new();
        let b = a.clone();
        a.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert!(b.contains("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_lives_for_one_second() {
        let store = InMemoryStore::new();
        store.set("k", "v", Duration::ZERO).await.unwrap();
        assert!(store.contains("k"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!store.contains("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_does_not_overflow() {
        let store = InMemoryStore::new();
        store.set("k", "v", Duration::MAX).await.unwrap();

        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;
        assert!(store.contains("k"));
    }
}
