// Allow dead code - parts of the registry API are kept for completeness
#![allow(dead_code)]

//! Groat Peer Registry Daemon
//!
//! Maintains a durable registry of Groat network peers. Each peer carries a
//! strength: the verified depth of the proof-of-work chain in its latest
//! credential document. Update passes poll every peer, rescore the ones
//! that prove themselves, and evict the unreachable and the invalid, so
//! the registry cleans itself without an external curator.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       GROAT-PEERD                          │
//! ├────────────────────────────────────────────────────────────┤
//! │  Peer Registry (RocksDB)   ←── ordered, deduplicated list  │
//! │  Credential Client (HTTP)  ←── GET /credential.json        │
//! │  Credential Verifier       ←── proof-of-work chain check   │
//! │  Registry Updater          ←── poll → verify → rescore     │
//! │  CLI / Maintenance Loop    ←── one-shot or periodic        │
//! └────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tracing::{info, warn};

mod cli;
mod clock;
mod config;
mod credential;
mod fetch;
mod registry;
mod types;
mod update;

#[cfg(test)]
mod tests;

use cli::{Cli, Commands};
use config::PeerdConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .init();

    // Load configuration
    let config_path = cli.get_config_path();
    let config = if config_path.exists() {
        PeerdConfig::load(&config_path)?
    } else {
        if cli.config.is_some() {
            warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
        }
        PeerdConfig::default()
    };

    // Override config with CLI args
    let config = match &cli.command {
        Commands::Update { timeout } => config.with_fetch_timeout(*timeout),
        Commands::Run { interval, timeout } => config
            .with_update_interval(*interval)
            .with_fetch_timeout(*timeout),
        _ => config,
    };

    config.validate()?;

    let data_dir = cli.get_data_dir();
    let mut registry = cli::runner::open_registry(&data_dir)?;

    match cli.command {
        Commands::List => cli::runner::cmd_list(&registry),
        Commands::Add { addr } => cli::runner::cmd_add(&mut registry, &addr),
        Commands::Remove { addr } => cli::runner::cmd_remove(&mut registry, &addr),
        Commands::Clean => cli::runner::cmd_clean(&mut registry),
        Commands::Reset => cli::runner::cmd_reset(&mut registry, &config),
        Commands::Update { .. } => cli::runner::cmd_update(registry, &config).await,
        Commands::Run { .. } => {
            info!("🌐 groat-peerd v{}", env!("CARGO_PKG_VERSION"));
            info!("⚙️  Configuration:");
            info!("   Data dir: {}", data_dir.display());
            info!("   Update interval: {}s", config.update_interval_secs);
            info!("   Fetch timeout: {}s", config.fetch_timeout_secs);
            info!(
                "   Credential window: {}s age, {}s skew",
                config.credential_max_age_secs, config.credential_max_skew_secs
            );
            info!(
                "   Proof difficulty: {} base bits, {} tokens max",
                config.pow_base_bits, config.pow_max_tokens
            );

            if registry.is_empty() {
                warn!("Registry is empty; 'groat-peerd reset' seeds the bootstrap peers");
            }

            cli::runner::run_daemon(registry, &config).await
        }
    }
}
