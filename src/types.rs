//! Core types for the peer registry
//!
//! These types define what the registry tracks (peers and their cached
//! strengths) and what peers hand back when polled (credential documents).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Network address of a remote peer, the unique key within the registry.
///
/// Displays as `host:port` and parses back from the same form, which is
/// also how bootstrap peers are written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr {
    /// Hostname or IP address
    pub host: String,

    /// TCP port the peer serves its credential on
    pub port: u16,
}

impl PeerAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerAddr {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddrParseError(format!("'{}' is missing a ':port' suffix", s)))?;

        if host.is_empty() {
            return Err(AddrParseError(format!("'{}' has an empty host", s)));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| AddrParseError(format!("'{}' has an invalid port", s)))?;

        Ok(Self::new(host, port))
    }
}

/// Error parsing a `host:port` string
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid peer address: {0}")]
pub struct AddrParseError(String);

/// A registered peer with its cached reputation strength.
///
/// Strength is 0 until the first successful scoring and always equals the
/// last confirmed verdict afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Registry key
    pub addr: PeerAddr,

    /// Cached proof-chain depth from the last valid credential
    pub strength: u32,
}

impl Peer {
    /// Create a fresh entry with no confirmed strength yet
    pub fn new(addr: PeerAddr) -> Self {
        Self { addr, strength: 0 }
    }
}

/// Credential document a peer returns when polled.
///
/// Ephemeral: it lives for one verification and is never persisted. The
/// proof tokens extend a hash chain seeded by the claimed identity and
/// issuance time; their verified count is the credential's strength.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialDocument {
    /// Issuance time (RFC 3339)
    pub time: DateTime<Utc>,

    /// Host the credential claims to belong to
    pub host: String,

    /// Port the credential claims to belong to
    pub port: u16,

    /// Ordered proof-of-work tokens, each extending the chain
    pub tokens: Vec<String>,
}

/// Result of verifying one credential against the polled peer.
///
/// Consumed immediately by the update pass: valid verdicts rescore the
/// peer, invalid ones evict it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the credential passed every check
    pub valid: bool,

    /// Number of proof tokens verified in order before the first failure
    pub strength: u32,
}

impl Verdict {
    /// The verdict for anything that fails before chain verification
    pub fn rejected() -> Self {
        Self {
            valid: false,
            strength: 0,
        }
    }
}
