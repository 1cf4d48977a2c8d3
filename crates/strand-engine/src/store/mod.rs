//! Record store contract and backends
//!
//! The store is the only shared mutable resource in the system. It owns
//! the durable representation of records and is the authoritative
//! enforcement point for the two uniqueness constraints: `hash` globally,
//! `(chain_id, index)` per chain. The engine relies on those constraints
//! to detect concurrent duplicate appends that slip past a recreated
//! chain serializer.

use async_trait::async_trait;

use strand_core::{ContentHasher, Hash, Record};

pub mod error;
pub mod memory;

// SQLite is only available on native targets (not WASM)
#[cfg(not(target_arch = "wasm32"))]
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use sqlite::SqliteStore;

/// Pagination window over a single chain
#[derive(Debug, Clone, Default)]
pub struct ChainRange {
    /// Records to skip from the start (after reversal, when reversed)
    pub offset: u64,

    /// Maximum records to return; `None` means unbounded
    pub limit: Option<u64>,

    /// Return records in descending index order
    pub reverse: bool,
}

impl ChainRange {
    /// Window over `limit` records starting at chain index `offset`
    pub fn window(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
            reverse: false,
        }
    }
}

/// Store-level record filter; all set fields combine with AND
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub chain_id: Option<String>,
    pub module: Option<String>,
    pub created_from: Option<u64>,
    pub created_to: Option<u64>,
}

impl RecordFilter {
    fn matches(&self, record: &Record) -> bool {
        if let Some(ref chain_id) = self.chain_id {
            if record.chain_id != *chain_id {
                return false;
            }
        }
        if let Some(ref module) = self.module {
            if record.module != *module {
                return false;
            }
        }
        if let Some(from) = self.created_from {
            if record.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.created_to {
            if record.created_at > to {
                return false;
            }
        }
        true
    }
}

/// Durable key/value contract over records.
///
/// Implementations must present identical pre- and post-conditions:
/// `put` is atomic and fails with a typed error on either uniqueness
/// violation, reads observe any committed write, and ordering follows
/// the documented rules per method.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Atomically insert one record.
    ///
    /// Fails [`StoreError::DuplicateHash`] if the hash exists anywhere in
    /// the store, [`StoreError::DuplicateChainIndex`] if the chain slot is
    /// taken. For durable backends, success implies durability.
    async fn put(&self, record: &Record) -> StoreResult<()>;

    /// Fetch a record by its content hash
    async fn get_by_hash(&self, hash: &Hash) -> StoreResult<Option<Record>>;

    /// Records of one chain ordered by index, descending when reversed.
    ///
    /// An unknown chain yields an empty vector.
    async fn get_chain(&self, chain_id: &str, range: &ChainRange) -> StoreResult<Vec<Record>>;

    /// The record with the greatest index in the chain, if any
    async fn get_head(&self, chain_id: &str) -> StoreResult<Option<Record>>;

    /// All records matching `filter`, ordered by index when the filter
    /// pins a chain, otherwise by `(created_at, hash)`
    async fn find(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>>;

    /// Total number of records in the store
    async fn count(&self) -> StoreResult<u64>;

    /// Re-verify every chain held by the store (hash recomputation and
    /// link checks)
    async fn verify_integrity(&self, hasher: &dyn ContentHasher) -> StoreResult<()>;

    /// Whether writes survive process restart
    fn is_durable(&self) -> bool;
}
