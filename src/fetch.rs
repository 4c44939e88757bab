//! Credential fetching
//!
//! Every registered peer serves its credential document over plain HTTP at
//! `/credential.json`. A pass polls each peer exactly once; whether the
//! answer is missing, broken, or stale is for the verifier and the update
//! pass to judge.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::types::PeerAddr;

/// Why a credential fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connect, DNS, timeout, or body-read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer answered, but not with a success status
    #[error("HTTP status {0}")]
    Status(u16),
}

/// One credential fetch from one peer.
///
/// A single attempt per call: retrying belongs to the update schedule,
/// not to the client.
#[async_trait]
pub trait CredentialFetch: Send + Sync {
    async fn fetch_credential(&self, peer: &PeerAddr) -> Result<String, FetchError>;
}

/// HTTP client polling `GET http://<host>:<port>/credential.json`
pub struct HttpCredentialClient {
    client: reqwest::Client,
}

impl HttpCredentialClient {
    /// Build the client once; its connection pool is reused across passes
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("HTTP client error: {}", e)))?;

        Ok(Self { client })
    }
}

fn credential_url(peer: &PeerAddr) -> String {
    format!("http://{}/credential.json", peer)
}

#[async_trait]
impl CredentialFetch for HttpCredentialClient {
    async fn fetch_credential(&self, peer: &PeerAddr) -> Result<String, FetchError> {
        let url = credential_url(peer);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            debug!("{}: credential fetch answered {}", peer, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(format!("Read body failed: {}", e)))
    }
}
