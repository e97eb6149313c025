//! # Tier Module
//!
//! The two cache tiers orchestrated by [`crate::CacheService`].

pub mod distributed;
pub mod memory;

pub use distributed::DistributedTier;
pub use memory::{CacheEntry, MemoryTier};
