//! # Cache Service
//!
//! Orchestrates the memory tier and the optional distributed tier behind a
//! single get/set/invalidate contract.
//!
//! - Reads prefer the cheapest source: memory, then the distributed tier,
//!   repopulating memory on a distributed hit.
//! - Writes always land in memory; the distributed write is best effort.
//! - Invalidation runs against each tier independently.
//!
//! Nothing a tier does wrong reaches the caller. A failing distributed tier
//! turns into misses and no-ops, reported to the [`CacheObserver`].
//!
//! Concurrent misses on one key are not de-duplicated: each caller queries
//! the distributed tier and, through [`CacheService::get_or_insert_with`],
//! recomputes on its own.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use crate::codec;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::keys;
use crate::observer::{CacheEvent, CacheObserver, Tier, TierOp, TracingObserver};
use crate::pattern::KeyPattern;
use crate::tier::{DistributedTier, MemoryTier};

/// Two-tier response cache
pub struct CacheService {
    memory: MemoryTier,
    distributed: DistributedTier,
    distributed_ttl: Duration,
    observer: Arc<dyn CacheObserver>,
}

impl CacheService {
    /// Create a service over an already-built distributed tier
    #[must_use]
    pub fn new(config: &CacheConfig, distributed: DistributedTier) -> Self {
        Self {
            memory: MemoryTier::new(config.memory_ttl),
            distributed,
            distributed_ttl: config.distributed_ttl,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Create a service, enabling the distributed tier when configured
    ///
    /// # Errors
    ///
    /// Returns [`crate::CacheError::Config`] if distributed credentials are
    /// present but unusable.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let distributed = DistributedTier::from_config(config)?;
        Ok(Self::new(config, distributed))
    }

    /// Replace the observer receiving [`CacheEvent`]s
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub const fn memory(&self) -> &MemoryTier {
        &self.memory
    }

    #[must_use]
    pub const fn distributed(&self) -> &DistributedTier {
        &self.distributed
    }

    /// TTL applied by [`CacheService::set`] to the distributed tier
    #[must_use]
    pub const fn distributed_ttl(&self) -> Duration {
        self.distributed_ttl
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Look up `key`, trying memory first and the distributed tier second.
    ///
    /// Returns `None` on a miss in both tiers, on any distributed tier
    /// failure, and when the cached value does not deserialize into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let started = Instant::now();

        if let Some(value) = self.memory.get(key) {
            let typed = self.typed(key, Tier::Memory, &value)?;
            self.emit(CacheEvent::Hit {
                key: key.to_string(),
                tier: Tier::Memory,
                latency: started.elapsed(),
            });
            return Some(typed);
        }

        if self.distributed.is_available() {
            if let Some(value) = self.read_distributed(key).await {
                let value = Arc::new(value);
                self.memory.insert(key, Arc::clone(&value));

                let typed = self.typed(key, Tier::Distributed, &value)?;
                self.emit(CacheEvent::Hit {
                    key: key.to_string(),
                    tier: Tier::Distributed,
                    latency: started.elapsed(),
                });
                return Some(typed);
            }
        }

        self.emit(CacheEvent::Miss { key: key.to_string(), latency: started.elapsed() });
        None
    }

    async fn read_distributed(&self, key: &str) -> Option<Value> {
        let payload = match self.distributed.get(key).await {
            Ok(payload) => payload?,
            Err(e) => {
                self.tier_error(key, Tier::Distributed, TierOp::Get, &e);
                return None;
            }
        };

        match codec::decode(&payload) {
            Ok(value) => Some(value),
            Err(e) => {
                self.tier_error(key, Tier::Distributed, TierOp::Decode, &e);
                None
            }
        }
    }

    fn typed<T: DeserializeOwned>(&self, key: &str, tier: Tier, value: &Value) -> Option<T> {
        match T::deserialize(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                self.tier_error(key, tier, TierOp::Decode, &e);
                None
            }
        }
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    /// Store `value` under `key` with the default distributed TTL
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.distributed_ttl).await;
    }

    /// Store `value` under `key`, expiring from the distributed tier after `ttl`.
    ///
    /// The memory write always happens first. A failing distributed write is
    /// reported to the observer and otherwise ignored.
    pub async fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let started = Instant::now();
        let value = match serde_json::to_value(value) {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.tier_error(key, Tier::Memory, TierOp::Set, &e);
                return;
            }
        };

        self.memory.insert(key, Arc::clone(&value));
        self.emit(CacheEvent::Set {
            key: key.to_string(),
            tier: Tier::Memory,
            latency: started.elapsed(),
            compression_ratio: None,
        });

        if !self.distributed.is_available() {
            return;
        }

        let encoded = match codec::encode(value.as_ref()) {
            Ok(encoded) => encoded,
            Err(e) => {
                self.tier_error(key, Tier::Distributed, TierOp::Set, &e);
                return;
            }
        };

        let started = Instant::now();
        match self.distributed.set(key, &encoded.payload, ttl).await {
            Ok(()) => self.emit(CacheEvent::Set {
                key: key.to_string(),
                tier: Tier::Distributed,
                latency: started.elapsed(),
                compression_ratio: Some(encoded.ratio()),
            }),
            Err(e) => self.tier_error(key, Tier::Distributed, TierOp::Set, &e),
        }
    }

    /// Cached value for `key`, or the result of `compute` stored on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` returns; the cache itself never fails.
    pub async fn get_or_insert_with<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }

        let value = compute().await?;
        self.set(key, &value).await;
        Ok(value)
    }

    // =========================================================================
    // INVALIDATION
    // =========================================================================

    /// Remove every key matching the glob `pattern` from both tiers.
    ///
    /// Returns the number of distinct keys removed; a key held by both tiers
    /// counts once. A failure in the distributed tier leaves the memory
    /// removals in place and counts only those.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        let pattern = KeyPattern::new(pattern);

        let mut removed: HashSet<String> = self.memory.invalidate(&pattern).into_iter().collect();
        self.emit(CacheEvent::Invalidate {
            pattern: pattern.to_string(),
            tier: Tier::Memory,
            removed: removed.len(),
        });

        if self.distributed.is_available() {
            if let Some(keys) = self.invalidate_distributed(&pattern).await {
                removed.extend(keys);
            }
        }

        removed.len()
    }

    async fn invalidate_distributed(&self, pattern: &KeyPattern) -> Option<Vec<String>> {
        let keys = match self.distributed.find_keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                self.tier_error(pattern.as_str(), Tier::Distributed, TierOp::Invalidate, &e);
                return None;
            }
        };

        let deleted = match self.distributed.delete(&keys).await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.tier_error(pattern.as_str(), Tier::Distributed, TierOp::Invalidate, &e);
                return None;
            }
        };

        self.emit(CacheEvent::Invalidate {
            pattern: pattern.to_string(),
            tier: Tier::Distributed,
            removed: deleted,
        });
        Some(keys)
    }

    /// Remove every entry of one tenant (`bootstrap:{id}*`)
    pub async fn invalidate_namespace(&self, id: &str) -> usize {
        self.invalidate(&keys::namespace_pattern(id)).await
    }

    // =========================================================================
    // OBSERVABILITY
    // =========================================================================

    fn emit(&self, event: CacheEvent) {
        self.observer.on_event(&event);
    }

    fn tier_error(&self, key: &str, tier: Tier, op: TierOp, error: &dyn std::fmt::Display) {
        self.emit(CacheEvent::TierError {
            key: key.to_string(),
            tier,
            op,
            error: error.to_string(),
        });
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("memory", &self.memory)
            .field("distributed", &self.distributed)
            .field("distributed_ttl", &self.distributed_ttl)
            .finish_non_exhaustive()
    }
}

/// Shared cache service handle
pub type SharedCacheService = Arc<CacheService>;

/// Wrap a service for sharing across tasks
#[must_use]
pub fn shared_cache(service: CacheService) -> SharedCacheService {
    Arc::new(service)
}
