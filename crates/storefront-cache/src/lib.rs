//! # Storefront Cache
//!
//! Tiered response cache for expensive per-tenant bootstrap payloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Callers (HTTP layer, tenant data)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CacheService                          │
//! │         get / set / invalidate / invalidate_namespace       │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │    MemoryTier (L1)      │   │   DistributedTier (L2)       │
//! │  DashMap, 60s lazy TTL  │   │ codec ▸ KeyValueStore (Redis)│
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! The distributed tier is optional. Without credentials the cache runs on
//! the memory tier alone with identical correctness guarantees.
//!
//! ## Features
//!
//! - `redis`: Enable the Redis-backed distributed tier (default)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_cache::{CacheConfig, CacheService, keys};
//!
//! let cache = CacheService::from_config(&CacheConfig::from_env())?;
//!
//! let key = keys::bootstrap_key(&tenant_id);
//! let bootstrap: Bootstrap = cache
//!     .get_or_insert_with(&key, || load_bootstrap(&db, &tenant_id))
//!     .await?;
//!
//! // After a tenant update
//! cache.invalidate_namespace(&tenant_id).await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod codec;
pub mod config;
pub mod error;
pub mod keys;
pub mod observer;
pub mod pattern;
pub mod service;
pub mod store;
pub mod tier;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use observer::{CacheEvent, CacheObserver, NoopObserver, Tier, TierOp, TracingObserver};
pub use pattern::KeyPattern;
pub use service::{CacheService, SharedCacheService, shared_cache};
pub use store::{InMemoryStore, KeyValueStore};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use tier::{DistributedTier, MemoryTier};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
