// Runner - Command execution over the registry
// Principle: open, act, report

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clock::SystemClock;
use crate::config::PeerdConfig;
use crate::credential::CredentialVerifier;
use crate::fetch::HttpCredentialClient;
use crate::registry::store::RocksDbStore;
use crate::registry::PeerRegistry;
use crate::types::PeerAddr;
use crate::update::{RegistryUpdater, UpdateReport};

/// Open (or create) the registry inside the data directory
pub fn open_registry(data_dir: &Path) -> anyhow::Result<PeerRegistry> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let store = Arc::new(RocksDbStore::open(&data_dir.join("registry"))?);
    Ok(PeerRegistry::open(store)?)
}

pub fn cmd_list(registry: &PeerRegistry) -> anyhow::Result<()> {
    let peers = registry.enumerate();

    if peers.is_empty() {
        println!("No peers registered.");
        print_seed_hint();
        return Ok(());
    }

    for peer in &peers {
        println!("{}  strength {}", peer.addr, peer.strength);
    }
    println!("{} peers total", peers.len());

    Ok(())
}

pub fn cmd_add(registry: &mut PeerRegistry, addr: &str) -> anyhow::Result<()> {
    let addr: PeerAddr = addr.parse()?;

    if registry.add(addr.clone())? {
        println!("Added {}", addr);
    } else {
        println!("{} is already registered", addr);
    }

    Ok(())
}

pub fn cmd_remove(registry: &mut PeerRegistry, addr: &str) -> anyhow::Result<()> {
    let addr: PeerAddr = addr.parse()?;

    if registry.remove(&addr)? {
        println!("Removed {}", addr);
    } else {
        println!("{} is not registered", addr);
    }

    Ok(())
}

pub fn cmd_clean(registry: &mut PeerRegistry) -> anyhow::Result<()> {
    let removed = registry.clear()?;
    println!("Removed {} peers", removed);
    Ok(())
}

/// Wipe the registry and seed it with the configured bootstrap peers
pub fn cmd_reset(registry: &mut PeerRegistry, config: &PeerdConfig) -> anyhow::Result<()> {
    registry.clear()?;

    for entry in &config.bootstrap_peers {
        let addr: PeerAddr = entry.parse()?;
        registry.add(addr.clone())?;
        println!("Added bootstrap peer {}", addr);
    }

    println!("Registry reset to {} bootstrap peers", registry.len());
    Ok(())
}

/// Run a single update pass and print the per-peer outcomes
pub async fn cmd_update(registry: PeerRegistry, config: &PeerdConfig) -> anyhow::Result<()> {
    let registry = Arc::new(RwLock::new(registry));
    let updater = build_updater(registry.clone(), config)?;

    let report = updater.update().await?;

    for (addr, outcome) in &report.entries {
        println!("{}  {}", addr, outcome);
    }
    println!(
        "{} peers checked: {} alive, {} evicted",
        report.entries.len(),
        report.rescored_count(),
        report.evicted_count()
    );

    if registry.read().await.is_empty() {
        println!("The registry is now empty.");
        print_seed_hint();
    }

    Ok(())
}

/// Run update passes forever, one per interval, until Ctrl+C.
///
/// A signal during a pass abandons the in-flight fetch; mutations already
/// applied for earlier peers stand, the current peer is left untouched.
pub async fn run_daemon(registry: PeerRegistry, config: &PeerdConfig) -> anyhow::Result<()> {
    let registry = Arc::new(RwLock::new(registry));
    let updater = build_updater(registry.clone(), config)?;

    let mut interval = tokio::time::interval(Duration::from_secs(config.update_interval_secs));

    info!(
        "✅ Maintenance loop started (a pass every {}s)",
        config.update_interval_secs
    );
    info!("   Press Ctrl+C to shut down gracefully");

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Shutdown signal received");
                break;
            }
        }

        tokio::select! {
            result = updater.update() => {
                let report = result?;
                log_pass(&registry, &report).await;
            }
            _ = tokio::signal::ctrl_c() => {
                updater.cancel();
                info!("🛑 Shutdown signal received, pass abandoned");
                break;
            }
        }
    }

    info!("👋 groat-peerd shutting down");
    Ok(())
}

fn build_updater(
    registry: Arc<RwLock<PeerRegistry>>,
    config: &PeerdConfig,
) -> anyhow::Result<RegistryUpdater> {
    let client = Arc::new(HttpCredentialClient::new(Duration::from_secs(
        config.fetch_timeout_secs,
    ))?);
    let verifier = CredentialVerifier::from_config(config, Arc::new(SystemClock));

    Ok(RegistryUpdater::new(registry, client, verifier))
}

async fn log_pass(registry: &Arc<RwLock<PeerRegistry>>, report: &UpdateReport) {
    let remaining = registry.read().await.len();

    info!(
        "📊 Pass done: {} checked, {} alive, {} evicted, {} registered",
        report.entries.len(),
        report.rescored_count(),
        report.evicted_count(),
        remaining
    );

    if remaining == 0 {
        warn!("Registry is empty; add peers with 'groat-peerd add HOST:PORT' or 'groat-peerd reset'");
    }
}

fn print_seed_hint() {
    println!("Add one with 'groat-peerd add HOST:PORT', or seed the bootstrap list with 'groat-peerd reset'.");
}
