//! Peer registry
//!
//! Authoritative, insertion-ordered list of known peers, unique by address.
//! Survives restarts: every state-changing call persists the whole ordered
//! list before returning, so a crash right after a successful call never
//! loses that mutation. Calls that change nothing do not write.

pub mod store;

use std::sync::Arc;
use tracing::{debug, info};

use crate::types::{Peer, PeerAddr};
use store::{RegistryStore, StoreError};

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("peer {0} is not registered")]
    PeerNotFound(PeerAddr),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The ordered peer list and its durable home.
///
/// Mutations build the new list first, persist it, and only then replace
/// the in-memory state, so memory never runs ahead of disk.
pub struct PeerRegistry {
    store: Arc<dyn RegistryStore>,
    peers: Vec<Peer>,
}

impl PeerRegistry {
    /// Open the registry over a store, loading whatever it last saved
    pub fn open(store: Arc<dyn RegistryStore>) -> Result<Self, RegistryError> {
        let peers = store.load()?;
        info!("📦 Loaded {} peers from registry", peers.len());

        Ok(Self { store, peers })
    }

    /// Ordered snapshot of the current peers
    pub fn enumerate(&self) -> Vec<Peer> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Register a peer. Returns whether it was actually added; re-adding
    /// a known address changes nothing, including its strength.
    pub fn add(&mut self, addr: PeerAddr) -> Result<bool, RegistryError> {
        if self.peers.iter().any(|p| p.addr == addr) {
            return Ok(false);
        }

        let mut candidate = self.peers.clone();
        candidate.push(Peer::new(addr.clone()));
        self.store.save(&candidate)?;
        self.peers = candidate;

        debug!("Added peer {}", addr);
        Ok(true)
    }

    /// Drop a peer. Returns whether it was present; removing an unknown
    /// address is a no-op, not an error.
    pub fn remove(&mut self, addr: &PeerAddr) -> Result<bool, RegistryError> {
        let pos = match self.peers.iter().position(|p| &p.addr == addr) {
            Some(pos) => pos,
            None => return Ok(false),
        };

        let mut candidate = self.peers.clone();
        candidate.remove(pos);
        self.store.save(&candidate)?;
        self.peers = candidate;

        debug!("Removed peer {}", addr);
        Ok(true)
    }

    /// Drop every peer, returning how many were removed
    pub fn clear(&mut self) -> Result<usize, RegistryError> {
        if self.peers.is_empty() {
            return Ok(0);
        }

        self.store.save(&[])?;
        let removed = self.peers.len();
        self.peers.clear();

        debug!("Cleared {} peers", removed);
        Ok(removed)
    }

    /// Update the cached strength of a registered peer.
    ///
    /// Fails with `PeerNotFound` if the address is absent, which a caller
    /// racing a concurrent remove must tolerate. An unchanged strength
    /// skips the write.
    pub fn rescore(&mut self, addr: &PeerAddr, strength: u32) -> Result<(), RegistryError> {
        let pos = match self.peers.iter().position(|p| &p.addr == addr) {
            Some(pos) => pos,
            None => return Err(RegistryError::PeerNotFound(addr.clone())),
        };

        if self.peers[pos].strength == strength {
            return Ok(());
        }

        let mut candidate = self.peers.clone();
        candidate[pos].strength = strength;
        self.store.save(&candidate)?;
        self.peers = candidate;

        debug!("Rescored peer {} to {}", addr, strength);
        Ok(())
    }
}
