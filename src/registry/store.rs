//! Registry persistence (RocksDB)
//!
//! The peer list is small and its order matters, so the whole ordered list
//! is stored as one bincode value under a single key. Every mutation writes
//! the full list; a reopened store yields exactly the list last saved.

use rocksdb::{Options, DB};
use std::path::Path;

use crate::types::Peer;

/// Key holding the ordered peer list
const PEERS_KEY: &[u8] = b"peers:list";

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open peer store: {0}")]
    OpenFailed(String),

    #[error("failed to read peer list: {0}")]
    ReadFailed(String),

    #[error("failed to write peer list: {0}")]
    WriteFailed(String),

    #[error("peer list encoding failed: {0}")]
    SerializationFailed(String),
}

/// Durable home of the ordered peer list
pub trait RegistryStore: Send + Sync {
    /// Load the persisted list; an empty store yields an empty list
    fn load(&self) -> Result<Vec<Peer>, StoreError>;

    /// Replace the persisted list with `peers`
    fn save(&self, peers: &[Peer]) -> Result<(), StoreError>;
}

/// RocksDB-backed store
pub struct RocksDbStore {
    db: DB,
}

impl RocksDbStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(100);
        opts.set_keep_log_file_num(3);

        let db = DB::open(&opts, path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;

        Ok(Self { db })
    }
}

impl RegistryStore for RocksDbStore {
    fn load(&self) -> Result<Vec<Peer>, StoreError> {
        let bytes = self
            .db
            .get(PEERS_KEY)
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        match bytes {
            Some(bytes) => bincode::deserialize(&bytes)
                .map_err(|e| StoreError::SerializationFailed(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, peers: &[Peer]) -> Result<(), StoreError> {
        let bytes = bincode::serialize(peers)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        self.db
            .put(PEERS_KEY, &bytes)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }
}
