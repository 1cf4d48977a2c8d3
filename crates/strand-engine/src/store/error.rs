//! Storage-contract error types

use thiserror::Error;

/// Storage-contract errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this hash is already committed
    #[error("duplicate hash: {0}")]
    DuplicateHash(String),

    /// The (chain_id, index) slot is already taken
    #[error("duplicate chain index: {chain_id}@{index}")]
    DuplicateChainIndex { chain_id: String, index: u64 },

    /// Backend failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Backend temporarily unreachable; the write outcome is undefined
    /// until the next successful read
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Record (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Integrity verification failed
    #[error("integrity check failed: {0}")]
    IntegrityFailed(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type StoreResult<T> = Result<T, StoreError>;
