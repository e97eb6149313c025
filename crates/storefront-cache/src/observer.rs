//! # Cache Observability
//!
//! The service reports what it does as typed [`CacheEvent`]s to an injected
//! [`CacheObserver`]. [`TracingObserver`] is the default sink and turns each
//! event into a structured `tracing` record.

use std::fmt;
use std::time::Duration;

/// Which tier an event concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Process-local memory tier (L1)
    Memory,
    /// Shared distributed tier (L2)
    Distributed,
}

impl Tier {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Distributed => "distributed",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operation that failed in a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierOp {
    Get,
    Set,
    Invalidate,
    Decode,
}

impl fmt::Display for TierOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Invalidate => "invalidate",
            Self::Decode => "decode",
        })
    }
}

/// Something the cache did
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// A value was served
    Hit { key: String, tier: Tier, latency: Duration },
    /// Neither tier could serve the key
    Miss { key: String, latency: Duration },
    /// A value was written to a tier
    Set {
        key: String,
        tier: Tier,
        latency: Duration,
        /// Compressed over raw size, distributed tier only
        compression_ratio: Option<f64>,
    },
    /// Entries matching a pattern were removed from a tier
    Invalidate { pattern: String, tier: Tier, removed: usize },
    /// A tier call failed and was treated as a miss or no-op
    TierError { key: String, tier: Tier, op: TierOp, error: String },
}

/// Sink for cache events
pub trait CacheObserver: Send + Sync {
    fn on_event(&self, event: &CacheEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CacheObserver for NoopObserver {
    fn on_event(&self, _event: &CacheEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_event(&self, event: &CacheEvent) {
        match event {
            CacheEvent::Hit { key, tier, latency } => {
                tracing::debug!(%key, %tier, latency = ?latency, "Cache hit");
            }
            CacheEvent::Miss { key, latency } => {
                tracing::debug!(%key, latency = ?latency, "Cache miss");
            }
            CacheEvent::Set { key, tier, latency, compression_ratio } => {
                tracing::debug!(
                    %key,
                    %tier,
                    latency = ?latency,
                    compression_ratio = ?compression_ratio,
                    "Cache set"
                );
            }
            CacheEvent::Invalidate { pattern, tier, removed } => {
                tracing::info!(%pattern, %tier, removed, "Cache invalidated");
            }
            CacheEvent::TierError { key, tier, op, error } => {
                tracing::warn!(%key, %tier, %op, %error, "Cache tier error, degrading");
            }
        }
    }
}
