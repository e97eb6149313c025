//! Shared distributed tier (L2).
//!
//! Whether the tier exists is decided once, when it is built from
//! configuration: missing credentials give [`DistributedTier::Disabled`] for
//! the life of the process. A configured tier whose store is unreachable
//! stays [`DistributedTier::Active`]; each failing call is reported to the
//! service, which degrades that call only.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheConfig, RedisCredentials};
use crate::error::Result;
use crate::pattern::KeyPattern;
use crate::store::KeyValueStore;

/// Distributed tier capability
#[derive(Clone, Default)]
pub enum DistributedTier {
    /// No distributed store configured
    #[default]
    Disabled,
    /// Backed by a key/value store
    Active(Arc<dyn KeyValueStore>),
}

impl DistributedTier {
    /// Build the tier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CacheError::Config`] when credentials are present but
    /// the endpoint is malformed, or when the crate was built without Redis
    /// support. Absent credentials are not an error.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let Some(credentials) = config.redis_credentials() else {
            tracing::info!("Distributed cache credentials not configured, using memory tier only");
            return Ok(Self::Disabled);
        };

        Self::connect(&credentials)
    }

    #[cfg(feature = "redis")]
    fn connect(credentials: &RedisCredentials) -> Result<Self> {
        let store = crate::store::RedisStore::new(&credentials.url, &credentials.token)?;
        tracing::info!(url = %credentials.url, "Distributed cache tier enabled");
        Ok(Self::active(store))
    }

    #[cfg(not(feature = "redis"))]
    fn connect(credentials: &RedisCredentials) -> Result<Self> {
        Err(crate::CacheError::Config(format!(
            "distributed cache configured at {} but redis support is not compiled in",
            credentials.url
        )))
    }

    /// Active tier over `store`
    pub fn active(store: impl KeyValueStore + 'static) -> Self {
        Self::Active(Arc::new(store))
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Disabled => Ok(None),
            Self::Active(store) => store.get(key).await,
        }
    }

    pub async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()> {
        match self {
            Self::Disabled => Ok(()),
            Self::Active(store) => store.set(key, payload, ttl).await,
        }
    }

    pub async fn find_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>> {
        match self {
            Self::Disabled => Ok(Vec::new()),
            Self::Active(store) => store.find_keys(pattern).await,
        }
    }

    pub async fn delete(&self, keys: &[String]) -> Result<usize> {
        match self {
            Self::Disabled => Ok(0),
            Self::Active(store) => store.delete(keys).await,
        }
    }
}

impl std::fmt::Debug for DistributedTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Active(_) => f.write_str("Active"),
        }
    }
}
