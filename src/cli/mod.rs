// CLI - Command line interface for groat-peerd
// Principle: one small command per registry operation

pub mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Groat peer registry daemon
#[derive(Parser, Debug)]
#[command(name = "groat-peerd")]
#[command(author = "Groat Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Peer registry maintenance daemon for the Groat ledger network")]
#[command(long_about = r#"
groat-peerd keeps a durable registry of Groat network peers healthy.

An update pass polls every registered peer for its credential document,
verifies the proof-of-work chain inside it, rescores peers that prove
themselves, and evicts the unreachable and the invalid.

Seed the registry with the bootstrap peers:
  groat-peerd reset

Run one update pass:
  groat-peerd update

Run the maintenance daemon (a pass every update interval):
  groat-peerd run
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "GROAT_PEERD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory for the peer registry
    #[arg(short, long, global = true, env = "GROAT_PEERD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "GROAT_PEERD_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show all registered peers and their strengths
    List,

    /// Register a peer
    Add {
        /// Peer address
        #[arg(value_name = "HOST:PORT")]
        addr: String,
    },

    /// Drop a peer
    Remove {
        /// Peer address
        #[arg(value_name = "HOST:PORT")]
        addr: String,
    },

    /// Drop every registered peer
    Clean,

    /// Replace the registry with the bootstrap peers
    Reset,

    /// Run one update pass now
    Update {
        /// Per-fetch timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// Run the maintenance daemon
    Run {
        /// Seconds between update passes
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Per-fetch timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
}

impl Cli {
    /// Get the data directory, defaulting to the platform data dir
    pub fn get_data_dir(&self) -> PathBuf {
        if let Some(ref path) = self.data_dir {
            path.clone()
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("groat-peerd")
        }
    }

    /// Get the configuration file path, defaulting to one inside the data dir
    pub fn get_config_path(&self) -> PathBuf {
        if let Some(ref path) = self.config {
            path.clone()
        } else {
            self.get_data_dir().join("config.toml")
        }
    }
}
