//! # Command Line Interface
//!
//! Operator commands against the configured cache tiers.

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use storefront_cache::store::effective_ttl;
use storefront_cache::{CacheService, codec};

/// Inspect and invalidate the storefront response cache
#[derive(Debug, Parser)]
#[command(name = "storefront-cache", version, about)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the cached value for a key
    Get { key: String },

    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON document to store
        value: String,
        /// Distributed tier TTL in seconds
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Remove every key matching a glob (`*`, `?`)
    Invalidate { pattern: String },

    /// Remove every bootstrap entry of a tenant
    InvalidateTenant { tenant_id: String },

    /// Print the transport encoding of a JSON value
    Encode { value: String },

    /// Decode a transport payload (compressed or legacy plain JSON)
    Decode { payload: String },
}

/// Execute `command`, returning the text to print
pub async fn run(cache: &CacheService, command: Command) -> anyhow::Result<String> {
    match command {
        Command::Get { key } => Ok(match cache.get::<Value>(&key).await {
            Some(value) => serde_json::to_string_pretty(&value)?,
            None => format!("(miss) {key}"),
        }),

        Command::Set { key, value, ttl } => {
            let value: Value = serde_json::from_str(&value)?;
            let ttl = ttl.map_or(cache.distributed_ttl(), Duration::from_secs);
            cache.set_with_ttl(&key, &value, ttl).await;
            Ok(format!("stored {key} (ttl {}s)", effective_ttl(ttl).as_secs()))
        }

        Command::Invalidate { pattern } => {
            let removed = cache.invalidate(&pattern).await;
            Ok(format!("removed {removed} keys matching {pattern}"))
        }

        Command::InvalidateTenant { tenant_id } => {
            let removed = cache.invalidate_namespace(&tenant_id).await;
            tracing::info!(%tenant_id, removed, "Invalidated tenant cache");
            Ok(format!("removed {removed} entries for tenant {tenant_id}"))
        }

        Command::Encode { value } => {
            let value: Value = serde_json::from_str(&value)?;
            let encoded = codec::encode(&value)?;
            tracing::debug!(
                raw_len = encoded.raw_len,
                compressed_len = encoded.compressed_len,
                ratio = encoded.ratio(),
                "Encoded payload"
            );
            Ok(encoded.payload)
        }

        Command::Decode { payload } => {
            let (value, format) = codec::decode_with_format(&payload)?;
            tracing::debug!(?format, "Decoded payload");
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}
