//! Daemon configuration
//!
//! Configurable parameters for peer registry maintenance.
//! Default values balance registry hygiene against forging cost for
//! credential producers.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::PeerAddr;

/// Main configuration for the peer daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerdConfig {
    // === Timing ===

    /// Interval between update passes in daemon mode (seconds)
    pub update_interval_secs: u64,

    /// Timeout for one credential fetch (seconds)
    /// Exactly one attempt per peer per pass; there are no retries
    pub fetch_timeout_secs: u64,

    // === Credential freshness ===

    /// Maximum credential age before it is considered stale (seconds)
    pub credential_max_age_secs: u64,

    /// Maximum tolerated clock skew into the future (seconds)
    pub credential_max_skew_secs: u64,

    // === Proof-of-work chain ===

    /// Leading zero bits required of the first chain link
    /// Each further link requires one bit more, doubling its expected cost
    pub pow_base_bits: u32,

    /// Maximum proof tokens examined per credential
    pub pow_max_tokens: u32,

    // === Bootstrap ===

    /// Peers registered by the `reset` command (`host:port` entries)
    pub bootstrap_peers: Vec<String>,
}

impl Default for PeerdConfig {
    fn default() -> Self {
        Self {
            // Timing
            update_interval_secs: 600, // 10 minutes between passes
            fetch_timeout_secs: 30,

            // Freshness - 24h window, 1 minute forward skew
            credential_max_age_secs: 86_400,
            credential_max_skew_secs: 60,

            // Proof-of-work
            pow_base_bits: 16,
            pow_max_tokens: 64,

            // Bootstrap (current Groat seed nodes)
            bootstrap_peers: vec![
                "b1.groat.network:4096".to_string(),
                "b2.groat.network:4096".to_string(),
            ],
        }
    }
}

impl PeerdConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    // Builder-style methods for CLI overrides

    pub fn with_update_interval(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.update_interval_secs = secs;
        }
        self
    }

    pub fn with_fetch_timeout(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.fetch_timeout_secs = secs;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.update_interval_secs == 0 {
            anyhow::bail!("update_interval_secs must be greater than zero");
        }

        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("fetch_timeout_secs must be greater than zero");
        }

        if self.fetch_timeout_secs >= self.update_interval_secs {
            anyhow::bail!(
                "fetch_timeout_secs ({}) must be less than update_interval_secs ({})",
                self.fetch_timeout_secs,
                self.update_interval_secs
            );
        }

        if self.credential_max_age_secs <= self.credential_max_skew_secs {
            anyhow::bail!(
                "credential_max_age_secs ({}) must be greater than credential_max_skew_secs ({})",
                self.credential_max_age_secs,
                self.credential_max_skew_secs
            );
        }

        if self.pow_base_bits == 0 || self.pow_max_tokens == 0 {
            anyhow::bail!("pow_base_bits and pow_max_tokens must be greater than zero");
        }

        // A blake3 digest carries 256 bits; the deepest link must still be satisfiable
        if u64::from(self.pow_base_bits) + u64::from(self.pow_max_tokens) > 256 {
            anyhow::bail!(
                "pow_base_bits ({}) + pow_max_tokens ({}) must not exceed 256",
                self.pow_base_bits,
                self.pow_max_tokens
            );
        }

        for entry in &self.bootstrap_peers {
            entry
                .parse::<PeerAddr>()
                .map_err(|e| anyhow::anyhow!("bootstrap_peers entry {}", e))?;
        }

        Ok(())
    }
}
