//! # Cache Configuration
//!
//! Environment-based configuration for the tiered cache.

use std::env;
use std::time::Duration;

/// Default memory tier TTL
pub const DEFAULT_MEMORY_TTL: Duration = Duration::from_secs(60);

/// Default distributed tier TTL
pub const DEFAULT_DISTRIBUTED_TTL: Duration = Duration::from_secs(300);

/// Distributed tier credentials
#[derive(Clone, PartialEq, Eq)]
pub struct RedisCredentials {
    pub url: String,
    pub token: String,
}

impl std::fmt::Debug for RedisCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCredentials")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Tiered cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Redis endpoint (`CACHE_REDIS_URL`)
    pub redis_url: Option<String>,

    /// Redis access token (`CACHE_REDIS_TOKEN`)
    pub redis_token: Option<String>,

    /// Memory tier TTL (`CACHE_MEMORY_TTL_SECS`)
    pub memory_ttl: Duration,

    /// Default distributed tier TTL (`CACHE_DISTRIBUTED_TTL_SECS`)
    pub distributed_ttl: Duration,
}

impl CacheConfig {
    /// Load configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let secs = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .map_or(default, Duration::from_secs)
        };

        Self {
            redis_url: non_empty("CACHE_REDIS_URL"),
            redis_token: non_empty("CACHE_REDIS_TOKEN"),
            memory_ttl: secs("CACHE_MEMORY_TTL_SECS", DEFAULT_MEMORY_TTL),
            distributed_ttl: secs("CACHE_DISTRIBUTED_TTL_SECS", DEFAULT_DISTRIBUTED_TTL),
        }
    }

    /// Both credentials, or `None` if either is missing
    #[must_use]
    pub fn redis_credentials(&self) -> Option<RedisCredentials> {
        match (&self.redis_url, &self.redis_token) {
            (Some(url), Some(token)) => Some(RedisCredentials {
                url: url.clone(),
                token: token.clone(),
            }),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_redis(mut self, url: impl Into<String>, token: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self.redis_token = Some(token.into());
        self
    }

    #[must_use]
    pub const fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory_ttl = ttl;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_token: None,
            memory_ttl: DEFAULT_MEMORY_TTL,
            distributed_ttl: DEFAULT_DISTRIBUTED_TTL,
        }
    }
}
