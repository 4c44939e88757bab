//! Registry update pass
//!
//! One pass polls every registered peer once and lets the registry clean
//! itself: a peer that cannot be reached or cannot prove its credential is
//! evicted, a peer that proves it is rescored to the verified strength.
//! Per-peer failures never abort the rest of the pass; only a failure of
//! the registry's own storage does.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::credential::CredentialVerifier;
use crate::fetch::{CredentialFetch, FetchError};
use crate::registry::{PeerRegistry, RegistryError};
use crate::types::PeerAddr;

/// What one pass did to one peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Credential verified; the peer's cached strength is now this
    Rescored(u32),

    /// Fetch failed; the peer was removed
    EvictedUnreachable(FetchError),

    /// The peer answered, but its credential did not hold up
    EvictedInvalid,
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Rescored(strength) => write!(f, "alive, strength {}", strength),
            UpdateOutcome::EvictedUnreachable(e) => write!(f, "evicted ({})", e),
            UpdateOutcome::EvictedInvalid => write!(f, "evicted (invalid credential)"),
        }
    }
}

/// Ordered per-peer outcomes of one pass
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub entries: Vec<(PeerAddr, UpdateOutcome)>,
}

impl UpdateReport {
    pub fn rescored_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, UpdateOutcome::Rescored(_)))
            .count()
    }

    pub fn evicted_count(&self) -> usize {
        self.entries.len() - self.rescored_count()
    }
}

/// Runs update passes over the shared registry
pub struct RegistryUpdater {
    registry: Arc<RwLock<PeerRegistry>>,
    client: Arc<dyn CredentialFetch>,
    verifier: CredentialVerifier,
    cancelled: Arc<AtomicBool>,
}

impl RegistryUpdater {
    pub fn new(
        registry: Arc<RwLock<PeerRegistry>>,
        client: Arc<dyn CredentialFetch>,
        verifier: CredentialVerifier,
    ) -> Self {
        Self::with_cancel(registry, client, verifier, Arc::new(AtomicBool::new(false)))
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancel(
        registry: Arc<RwLock<PeerRegistry>>,
        client: Arc<dyn CredentialFetch>,
        verifier: CredentialVerifier,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            registry,
            client,
            verifier,
            cancelled,
        }
    }

    /// Ask the current and any future pass to stop at the next peer boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Run one pass over a snapshot of the registry.
    ///
    /// The snapshot is taken once at pass start; peers added meanwhile wait
    /// for the next pass. The lock is never held across the network fetch.
    pub async fn update(&self) -> Result<UpdateReport, RegistryError> {
        let snapshot = self.registry.read().await.enumerate();
        let total = snapshot.len();
        let mut entries = Vec::with_capacity(total);

        for peer in snapshot {
            if self.cancelled.load(Ordering::SeqCst) {
                info!("Update pass cancelled after {} of {} peers", entries.len(), total);
                break;
            }

            let outcome = self.update_peer(&peer.addr).await?;
            entries.push((peer.addr, outcome));
        }

        Ok(UpdateReport { entries })
    }

    async fn update_peer(&self, addr: &PeerAddr) -> Result<UpdateOutcome, RegistryError> {
        let body = match self.client.fetch_credential(addr).await {
            Ok(body) => body,
            Err(e) => {
                debug!("{}: unreachable: {}", addr, e);
                self.registry.write().await.remove(addr)?;
                return Ok(UpdateOutcome::EvictedUnreachable(e));
            }
        };

        let verdict = self.verifier.verify(addr, &body);

        if verdict.valid {
            match self.registry.write().await.rescore(addr, verdict.strength) {
                Ok(()) => {}
                // Lost a race with a concurrent remove; the verdict stands
                Err(RegistryError::PeerNotFound(_)) => {
                    debug!("{}: removed during the pass, rescore skipped", addr);
                }
                Err(e) => return Err(e),
            }
            Ok(UpdateOutcome::Rescored(verdict.strength))
        } else {
            self.registry.write().await.remove(addr)?;
            Ok(UpdateOutcome::EvictedInvalid)
        }
    }
}
