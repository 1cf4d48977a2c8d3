//! Blocking ledger facade for native hosts
//!
//! Owns a multi-thread tokio runtime and exposes the engine's operation
//! set as plain blocking calls, for hosts that are not async themselves.
//! The facade holds no state beyond the engine handle.

use std::sync::Arc;

use strand_core::{Hash, Record, VerificationReport};

use crate::acl::{AccessRequest, Grant, RevokeRequest};
use crate::config::LedgerConfig;
use crate::engine::{AppendInput, ChainEngine, VerifyOptions};
use crate::error::EngineError;
use crate::query::{QueryFilters, QueryResult};
use crate::store::ChainRange;

/// Blocking wrapper around [`ChainEngine`]
pub struct Ledger {
    engine: Arc<ChainEngine>,
    runtime: tokio::runtime::Runtime,
}

impl Ledger {
    /// Open a ledger from configuration
    pub fn open(config: LedgerConfig) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| EngineError::Runtime(e.to_string()))?;

        let engine = Arc::new(ChainEngine::new(config)?);

        Ok(Self { engine, runtime })
    }

    /// Wrap an existing engine
    pub fn from_engine(engine: Arc<ChainEngine>) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| EngineError::Runtime(e.to_string()))?;

        Ok(Self { engine, runtime })
    }

    /// Async engine handle, for hosts that mix blocking and async use
    pub fn engine(&self) -> Arc<ChainEngine> {
        self.engine.clone()
    }

    /// Ledger identifier
    pub fn id(&self) -> &str {
        self.engine.id()
    }

    /// Append one record, returning its hash
    pub fn append(&self, input: AppendInput) -> Result<Hash, EngineError> {
        self.runtime
            .block_on(self.engine.append(input))
            .map(|record| record.hash)
    }

    /// Append multiple records in order (partial commits retained on error)
    pub fn append_batch(&self, inputs: Vec<AppendInput>) -> Result<Vec<Hash>, EngineError> {
        let records = self.runtime.block_on(self.engine.append_batch(inputs))?;
        Ok(records.into_iter().map(|record| record.hash).collect())
    }

    /// Get a record by hash
    pub fn get(&self, hash: &Hash) -> Result<Option<Record>, EngineError> {
        self.runtime.block_on(self.engine.get_by_hash(hash))
    }

    /// Records of one chain in index order
    pub fn get_chain(&self, chain_id: &str, range: ChainRange) -> Result<Vec<Record>, EngineError> {
        self.runtime.block_on(self.engine.get_chain(chain_id, range))
    }

    /// Head of a chain
    pub fn get_head(&self, chain_id: &str) -> Result<Option<Record>, EngineError> {
        self.runtime.block_on(self.engine.get_head(chain_id))
    }

    /// Hash of a chain head
    pub fn latest_hash(&self, chain_id: &str) -> Result<Option<Hash>, EngineError> {
        self.runtime.block_on(self.engine.latest_hash(chain_id))
    }

    /// Query records with filters
    pub fn query(&self, filters: QueryFilters) -> Result<QueryResult, EngineError> {
        self.runtime.block_on(self.engine.query(filters))
    }

    /// Verify a chain segment
    pub fn verify(
        &self,
        chain_id: &str,
        options: VerifyOptions,
    ) -> Result<VerificationReport, EngineError> {
        self.runtime
            .block_on(self.engine.verify_chain(chain_id, options))
    }

    /// Total committed records
    pub fn length(&self) -> Result<u64, EngineError> {
        self.runtime.block_on(self.engine.len())
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> Result<bool, EngineError> {
        self.runtime.block_on(self.engine.is_empty())
    }

    /// Whether records survive process restart
    pub fn has_storage(&self) -> bool {
        self.engine.has_storage()
    }

    /// Verify durable storage integrity
    pub fn verify_storage(&self) -> Result<bool, EngineError> {
        self.runtime.block_on(self.engine.verify_storage())
    }

    /// Grant ACL access
    pub fn grant(&self, grant: Grant) -> Result<(), EngineError> {
        self.runtime.block_on(self.engine.grant(grant))
    }

    /// Check ACL access
    pub fn check(&self, request: &AccessRequest) -> Result<bool, EngineError> {
        self.runtime.block_on(self.engine.check_access(request))
    }

    /// Revoke ACL access
    pub fn revoke(&self, request: &RevokeRequest) -> Result<(), EngineError> {
        self.runtime.block_on(self.engine.revoke(request))
    }

    /// All active grants for a subject
    pub fn list_grants(&self, subject_oid: &str) -> Result<Vec<Grant>, EngineError> {
        self.runtime.block_on(self.engine.list_grants(subject_oid))
    }
}
