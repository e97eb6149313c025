//! # Storefront Cache CLI
//!
//! Binary entry point for the cache operator tool.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_cache::{CacheConfig, CacheService};

use crate::cli::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let config = CacheConfig::from_env();
    tracing::debug!(
        version = storefront_cache::VERSION,
        memory_ttl = ?config.memory_ttl,
        distributed_ttl = ?config.distributed_ttl,
        "Starting storefront cache CLI"
    );

    let cache = CacheService::from_config(&config)?;
    let output = run(&cache, cli.command).await?;
    println!("{output}");

    Ok(())
}
