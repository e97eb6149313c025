//! # Store Module
//!
//! Key/value store abstraction consumed by the distributed tier.
//!
//! - [`RedisStore`] - Redis (or any RESP-compatible service) via `redis`
//! - [`InMemoryStore`] - process-local store with store-side expiry, for
//!   tests and local development

#[cfg(feature = "redis")]
pub mod redis_store;
pub mod memory_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::pattern::KeyPattern;

#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
pub use memory_store::InMemoryStore;

/// Shortest expiry a store accepts; Redis rejects `EX 0`
pub const MIN_STORE_TTL: Duration = Duration::from_secs(1);

/// Expiry a store actually applies for a requested `ttl`, in whole seconds.
#[must_use]
pub fn effective_ttl(ttl: Duration) -> Duration {
    Duration::from_secs(ttl.as_secs()).max(MIN_STORE_TTL)
}

/// Network key/value store with native expiry and glob key lookup.
///
/// Every call may fail; the cache treats failures as misses or no-ops.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a payload
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a payload that the store expires after `ttl`
    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()>;

    /// All keys selected by `pattern`
    async fn find_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>>;

    /// Delete keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_ttl() {
        assert_eq!(effective_ttl(Duration::ZERO), MIN_STORE_TTL);
        assert_eq!(effective_ttl(Duration::from_millis(1500)), Duration::from_secs(1));
        assert_eq!(effective_ttl(Duration::from_secs(300)), Duration::from_secs(300));
    }
}
