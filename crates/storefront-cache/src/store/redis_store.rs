//! # Redis Store
//!
//! [`KeyValueStore`] backed by a Redis connection manager. The connection is
//! opened by the first call and shared afterwards; the manager reconnects on
//! its own when the link drops.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, IntoConnectionInfo};
use tokio::sync::OnceCell;

use super::{KeyValueStore, effective_ttl};
use crate::error::{CacheError, Result};
use crate::pattern::KeyPattern;

/// Redis-backed store
pub struct RedisStore {
    client: Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisStore {
    /// Build a store for `endpoint` (a `redis://` URL) authenticating with
    /// `token`. No connection is made here.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the endpoint is not a valid Redis URL.
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let mut info = endpoint
            .into_connection_info()
            .map_err(|e| CacheError::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;
        info.redis.password = Some(token.to_string());

        let client = Client::open(info)
            .map_err(|e| CacheError::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;

        Ok(Self { client, conn: OnceCell::new() })
    }

    /// Shared connection, opened on first use.
    ///
    /// A failed attempt is not remembered, so the next call tries again.
    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = ConnectionManager::new(self.client.clone()).await?;
                tracing::info!("Redis connected");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, payload: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let seconds = effective_ttl(ttl).as_secs();
        let _: () = conn.set_ex(key, payload, seconds).await?;
        Ok(())
    }

    async fn find_keys(&self, pattern: &KeyPattern) -> Result<Vec<String>> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(pattern.to_store_glob()).await?;
        Ok(keys)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection().await?;
        let deleted: usize = conn.del(keys).await?;
        Ok(deleted)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.client.get_connection_info().addr)
            .field("connected", &self.conn.initialized())
            .finish_non_exhaustive()
    }
}
