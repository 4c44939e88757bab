//! Credential verification
//!
//! A polled peer answers with a credential document: an issuance time, the
//! identity it claims, and an ordered list of proof-of-work tokens. The
//! verifier checks the claims in order and scores the proof chain.
//!
//! ## Proof chain
//!
//! The chain is seeded with `blake3("<host>:<port>:<unix-seconds>")` over
//! the polled identity and the issuance time. Token *i* (0-based) extends
//! it as `digest_i = blake3(digest_{i-1} || token_i)` and is accepted iff
//! `digest_i` has at least `pow_base_bits + i` leading zero bits, so every
//! further link doubles the expected mining cost. Strength is the number of
//! tokens verified in order before the first failure; any prefix of a valid
//! chain is itself valid.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::config::PeerdConfig;
use crate::types::{CredentialDocument, PeerAddr, Verdict};

/// Verifies credential documents against the peer they were polled from
pub struct CredentialVerifier {
    /// Time source for the freshness window
    clock: Arc<dyn Clock>,

    /// Maximum credential age (seconds)
    max_age_secs: u64,

    /// Maximum tolerated future skew (seconds)
    max_skew_secs: u64,

    /// Difficulty of the first chain link (leading zero bits)
    pow_base_bits: u32,

    /// Tokens examined per credential at most
    pow_max_tokens: u32,
}

impl CredentialVerifier {
    pub fn new(
        clock: Arc<dyn Clock>,
        max_age_secs: u64,
        max_skew_secs: u64,
        pow_base_bits: u32,
        pow_max_tokens: u32,
    ) -> Self {
        Self {
            clock,
            max_age_secs,
            max_skew_secs,
            pow_base_bits,
            pow_max_tokens,
        }
    }

    /// Build a verifier with the freshness and difficulty constants from config
    pub fn from_config(config: &PeerdConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            clock,
            config.credential_max_age_secs,
            config.credential_max_skew_secs,
            config.pow_base_bits,
            config.pow_max_tokens,
        )
    }

    /// Verify a fetched body against the polled peer.
    ///
    /// Never fails: anything that cannot be parsed or does not hold up is an
    /// invalid verdict. Checks run in order - parse, identity, freshness,
    /// proof chain - and the first failed check rejects the credential.
    pub fn verify(&self, peer: &PeerAddr, body: &str) -> Verdict {
        let doc: CredentialDocument = match serde_json::from_str(body) {
            Ok(doc) => doc,
            Err(e) => {
                debug!("{}: malformed credential: {}", peer, e);
                return Verdict::rejected();
            }
        };

        // A peer must not get credit for another peer's credential
        if doc.host != peer.host || doc.port != peer.port {
            debug!(
                "{}: credential claims {}:{}, identity mismatch",
                peer, doc.host, doc.port
            );
            return Verdict::rejected();
        }

        let now = self.clock.now_utc();
        let age = now.signed_duration_since(doc.time);

        if age > Duration::seconds(self.max_age_secs as i64) {
            debug!("{}: credential issued at {} is stale", peer, doc.time);
            return Verdict::rejected();
        }

        if age < -Duration::seconds(self.max_skew_secs as i64) {
            debug!("{}: credential issued at {} is in the future", peer, doc.time);
            return Verdict::rejected();
        }

        let strength = self.chain_strength(peer, &doc);

        Verdict {
            valid: strength > 0,
            strength,
        }
    }

    /// Count the proof tokens that extend the chain in order.
    ///
    /// Short-circuits on the first token below its difficulty; tokens past
    /// the configured cap are ignored.
    fn chain_strength(&self, peer: &PeerAddr, doc: &CredentialDocument) -> u32 {
        let mut digest = chain_seed(peer, doc.time);
        let mut strength = 0u32;

        for (i, token) in doc
            .tokens
            .iter()
            .take(self.pow_max_tokens as usize)
            .enumerate()
        {
            let difficulty = self.pow_base_bits + i as u32;
            let next = extend_chain(&digest, token);

            if leading_zero_bits(&next) < difficulty {
                debug!(
                    "{}: token {} digest {} is below difficulty {}",
                    peer,
                    i,
                    hex::encode(next),
                    difficulty
                );
                break;
            }

            digest = next;
            strength += 1;
        }

        strength
    }
}

/// Seed digest binding the chain to the polled identity and issuance time
pub(crate) fn chain_seed(addr: &PeerAddr, time: DateTime<Utc>) -> [u8; 32] {
    let seed = format!("{}:{}:{}", addr.host, addr.port, time.timestamp());
    *blake3::hash(seed.as_bytes()).as_bytes()
}

/// Extend the chain by one token
pub(crate) fn extend_chain(prev: &[u8; 32], token: &str) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prev);
    hasher.update(token.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Count leading zero bits of a digest
pub(crate) fn leading_zero_bits(digest: &[u8; 32]) -> u32 {
    let mut bits = 0;
    for byte in digest {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}
