use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use strand_core::{
    verify_segment, ContentHasher, Hash, Record, RecordDraft, Sha256Hasher, VerificationReport,
};

use crate::acl::{AccessRequest, AclBackend, Grant, InMemoryAcl, RevokeRequest};
use crate::clock::{Clock, SystemClock};
use crate::config::{AclConfig, LedgerConfig, StorageConfig};
use crate::error::EngineError;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::query::{QueryFilters, QueryResult, DEFAULT_QUERY_LIMIT};
use crate::registry::ModuleRegistry;
use crate::serializer::ChainSerializers;
use crate::store::{ChainRange, MemoryStore, RecordFilter, RecordStore};

#[cfg(not(target_arch = "wasm32"))]
use crate::acl::SqliteAcl;
#[cfg(not(target_arch = "wasm32"))]
use crate::store::SqliteStore;

/// One append request
#[derive(Debug, Clone)]
pub struct AppendInput {
    /// Module owning the body
    pub module: String,

    /// Chain to extend (created implicitly on first append)
    pub chain_id: String,

    /// Module-defined content
    pub body: Value,

    /// Caller-supplied metadata, stored verbatim.
    ///
    /// When the ACL is enabled, a `requester` string field is required
    /// here and checked against `(requester, chain_id, "append")`.
    pub context: Option<Value>,
}

impl AppendInput {
    pub fn new(module: impl Into<String>, chain_id: impl Into<String>, body: Value) -> Self {
        Self {
            module: module.into(),
            chain_id: chain_id.into(),
            body,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

/// Window for chain verification
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// First chain index to verify
    pub start_index: u64,

    /// Maximum records to verify
    pub limit: Option<u64>,
}

/// Chain engine - serializes appends per chain, dispatches module
/// validation and persists records through the store.
///
/// The engine holds no record state of its own: reads go straight to the
/// store, and the per-chain serializers are the only concurrency
/// primitive. Appends on distinct chains run in parallel.
pub struct ChainEngine {
    config: LedgerConfig,
    store: Arc<dyn RecordStore>,
    modules: ModuleRegistry,
    serializers: ChainSerializers,
    acl: Option<Arc<dyn AclBackend>>,
    hasher: Arc<dyn ContentHasher>,
    clock: Arc<dyn Clock>,
    metrics: Option<EngineMetrics>,
}

impl ChainEngine {
    /// Create a new engine, building the store from the storage config.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, unknown module names, or storage
    /// that cannot be opened. The `postgres` variant is accepted by config
    /// validation but is not compiled into this build.
    pub fn new(config: LedgerConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let store: Arc<dyn RecordStore> = match &config.storage {
            StorageConfig::None => Arc::new(MemoryStore::new()),

            #[cfg(not(target_arch = "wasm32"))]
            StorageConfig::Sqlite { path } => Arc::new(SqliteStore::open(path)?),

            #[cfg(target_arch = "wasm32")]
            StorageConfig::Sqlite { .. } => {
                return Err(EngineError::Unsupported(
                    "sqlite storage is not available on this target".to_string(),
                ));
            }

            StorageConfig::Postgres { .. } => {
                return Err(EngineError::Unsupported(
                    "postgres storage is not compiled into this build".to_string(),
                ));
            }
        };

        Self::with_store(config, store)
    }

    /// Create a new engine over a caller-supplied store.
    ///
    /// The storage section of the config is ignored; everything else is
    /// validated as usual.
    pub fn with_store(
        config: LedgerConfig,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let modules = ModuleRegistry::from_config(&config.modules)?;

        let acl: Option<Arc<dyn AclBackend>> = match &config.acl {
            AclConfig::None => None,
            AclConfig::InMemory => Some(Arc::new(InMemoryAcl::new())),

            #[cfg(not(target_arch = "wasm32"))]
            AclConfig::Sqlite { path } => Some(Arc::new(SqliteAcl::open(path)?)),

            #[cfg(target_arch = "wasm32")]
            AclConfig::Sqlite { .. } => {
                return Err(EngineError::Unsupported(
                    "sqlite acl is not available on this target".to_string(),
                ));
            }
        };

        let metrics = config.metrics_enabled().then(EngineMetrics::default);

        info!(
            ledger = %config.id,
            modules = modules.len(),
            durable = store.is_durable(),
            "chain engine ready"
        );

        Ok(Self {
            config,
            store,
            modules,
            serializers: ChainSerializers::new(),
            acl,
            hasher: Arc::new(Sha256Hasher),
            clock: Arc::new(SystemClock),
            metrics,
        })
    }

    /// Replace the injected hash function
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the injected clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Ledger identifier
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Handle to the underlying store
    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    /// Registered module names
    pub fn module_names(&self) -> Vec<String> {
        self.modules.names()
    }

    /// Operation counters, when `enable_metrics` is set
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    /// Append a record.
    ///
    /// Validates and normalizes the body through the owning module, then,
    /// under the chain's serializer, assigns `index`, `prev_hash` and a
    /// non-regressing `created_at`, seals the hash and persists.
    ///
    /// Dropping the future before the serializer is acquired is a no-op.
    /// Dropped mid-critical-section, the record may or may not have been
    /// committed; re-check via [`Self::get_head`] when certainty matters.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ModuleNotFound`] for an unregistered module
    /// - [`EngineError::Validation`] when the module rejects the body
    /// - [`EngineError::AccessDenied`] when the ACL rejects the requester
    /// - [`EngineError::DuplicateRecord`] when an identical logical record
    ///   is already committed (non-retryable)
    /// - [`EngineError::StorageConsistency`] when the chain slot was taken
    ///   despite the serializer (fatal, storage is corrupted)
    pub async fn append(&self, input: AppendInput) -> Result<Record, EngineError> {
        let module = self.modules.resolve(&input.module)?;

        self.authorize_append(&input).await?;

        if self.config.strict_validation() && !input.body.is_object() && !input.body.is_array() {
            return Err(EngineError::Validation {
                module: input.module.clone(),
                detail: "body must be a JSON object or array".to_string(),
            });
        }

        module
            .validate(&input.body, input.context.as_ref())
            .map_err(|e| EngineError::Validation {
                module: module.name().to_string(),
                detail: e.to_string(),
            })?;

        let body = module.normalize(input.body);

        let serializer = self.serializers.handle(&input.chain_id);
        let guard = serializer.lock().await;

        if let Some(cap) = self.config.max_entries() {
            if self.store.count().await? >= cap {
                return Err(EngineError::CapacityExceeded(cap));
            }
        }

        let head = self.store.get_head(&input.chain_id).await?;
        let (index, prev_hash, created_floor) = match &head {
            Some(head) => (head.index + 1, Some(head.hash), head.created_at),
            None => (0, None, 0),
        };
        // Wall clock may move backwards; created_at must not
        let created_at = self.clock.now_ms().max(created_floor);

        let record = RecordDraft {
            chain_id: input.chain_id,
            index,
            prev_hash,
            created_at,
            module: module.name().to_string(),
            body,
            context: input.context,
        }
        .seal(self.hasher.as_ref())?;

        match self.store.put(&record).await {
            Ok(()) => {}
            Err(crate::store::StoreError::DuplicateHash(hash)) => {
                return Err(EngineError::DuplicateRecord(hash));
            }
            Err(crate::store::StoreError::DuplicateChainIndex { chain_id, index }) => {
                return Err(EngineError::StorageConsistency(format!(
                    "slot {index} on chain {chain_id} was taken despite the serializer"
                )));
            }
            Err(other) => return Err(other.into()),
        }

        drop(guard);

        if let Some(metrics) = &self.metrics {
            metrics.record_append();
        }
        debug!(chain = %record.chain_id, index = record.index, hash = %record.hash, "record committed");

        // Observer hook: failures are logged, never surfaced
        if let Err(err) = module.after_append(&record) {
            warn!(module = %module.name(), error = %err, "after-append hook failed");
        }

        Ok(record)
    }

    /// Append multiple records in order.
    ///
    /// Each input is atomic on its own; there is no multi-input rollback.
    /// On failure, inputs before the failing one remain committed and the
    /// error reports the failing position. Callers needing transactional
    /// behavior must group by chain and wrap externally.
    pub async fn append_batch(
        &self,
        inputs: Vec<AppendInput>,
    ) -> Result<Vec<Record>, EngineError> {
        let mut committed = Vec::with_capacity(inputs.len());

        for (index, input) in inputs.into_iter().enumerate() {
            match self.append(input).await {
                Ok(record) => committed.push(record),
                Err(cause) => {
                    warn!(
                        index,
                        committed = committed.len(),
                        error = %cause,
                        "batch append stopped"
                    );
                    return Err(EngineError::Batch {
                        index,
                        source: Box::new(cause),
                    });
                }
            }
        }

        Ok(committed)
    }

    /// Get a record by hash; unknown hashes yield `None`
    pub async fn get_by_hash(&self, hash: &Hash) -> Result<Option<Record>, EngineError> {
        if let Some(metrics) = &self.metrics {
            metrics.record_read();
        }
        Ok(self.store.get_by_hash(hash).await?)
    }

    /// Records of one chain in index order; unknown chains yield an empty
    /// vector
    pub async fn get_chain(
        &self,
        chain_id: &str,
        range: ChainRange,
    ) -> Result<Vec<Record>, EngineError> {
        if let Some(metrics) = &self.metrics {
            metrics.record_read();
        }
        Ok(self.store.get_chain(chain_id, &range).await?)
    }

    /// Head of a chain; `None` for a chain that never existed
    pub async fn get_head(&self, chain_id: &str) -> Result<Option<Record>, EngineError> {
        if let Some(metrics) = &self.metrics {
            metrics.record_read();
        }
        Ok(self.store.get_head(chain_id).await?)
    }

    /// Hash of the chain head, if the chain exists
    pub async fn latest_hash(&self, chain_id: &str) -> Result<Option<Hash>, EngineError> {
        Ok(self.get_head(chain_id).await?.map(|record| record.hash))
    }

    /// Total committed records across all chains
    pub async fn len(&self) -> Result<u64, EngineError> {
        Ok(self.store.count().await?)
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> Result<bool, EngineError> {
        Ok(self.len().await? == 0)
    }

    /// Query records with AND-combined filters.
    ///
    /// Projection filters are applied only to records whose module
    /// advertises the filtered key; for other records the filter is
    /// ignored. Results are capped at [`DEFAULT_QUERY_LIMIT`] unless a
    /// limit is given.
    pub async fn query(&self, filters: QueryFilters) -> Result<QueryResult, EngineError> {
        let base = RecordFilter {
            chain_id: filters.chain_id,
            module: filters.module,
            created_from: filters.created_from,
            created_to: filters.created_to,
        };

        let mut records = self.store.find(&base).await?;

        if !filters.body_filters.is_empty() {
            records.retain(|record| self.matches_projections(record, &filters.body_filters));
        }

        let total = records.len();
        let offset = filters.offset.unwrap_or(0);
        let limit = filters.limit.unwrap_or(DEFAULT_QUERY_LIMIT);

        let records: Vec<Record> = records.into_iter().skip(offset).take(limit).collect();
        let has_more = offset + records.len() < total;

        if let Some(metrics) = &self.metrics {
            metrics.record_query();
        }

        Ok(QueryResult {
            records,
            total,
            has_more,
        })
    }

    fn matches_projections(
        &self,
        record: &Record,
        wanted: &serde_json::Map<String, Value>,
    ) -> bool {
        let Some(runtime) = self.modules.get(&record.module) else {
            return true;
        };
        let declared = runtime.projections();

        for (key, expected) in wanted {
            // Filters on undeclared keys are ignored for this record
            if !declared.contains(&key.as_str()) {
                continue;
            }
            if record.body.get(key) != Some(expected) {
                return false;
            }
        }
        true
    }

    /// Verify a chain segment.
    ///
    /// Observational: recomputes hashes, checks links, index density and
    /// timestamp monotonicity; never repairs.
    pub async fn verify_chain(
        &self,
        chain_id: &str,
        options: VerifyOptions,
    ) -> Result<VerificationReport, EngineError> {
        let range = ChainRange {
            offset: options.start_index,
            limit: options.limit,
            reverse: false,
        };
        let records = self.store.get_chain(chain_id, &range).await?;

        let anchor = if options.start_index > 0 {
            self.store
                .get_chain(chain_id, &ChainRange::window(options.start_index - 1, 1))
                .await?
                .first()
                .map(|record| record.hash)
        } else {
            None
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_verification();
        }

        Ok(verify_segment(
            &records,
            options.start_index,
            anchor,
            self.hasher.as_ref(),
        ))
    }

    /// Whether records survive process restart
    pub fn has_storage(&self) -> bool {
        self.store.is_durable()
    }

    /// Verify durable storage integrity.
    ///
    /// Returns `Ok(false)` when no durable storage is configured,
    /// `Ok(true)` when it is and every chain verifies.
    pub async fn verify_storage(&self) -> Result<bool, EngineError> {
        if !self.store.is_durable() {
            return Ok(false);
        }
        self.store.verify_integrity(self.hasher.as_ref()).await?;
        Ok(true)
    }

    /// Grant ACL access
    pub async fn grant(&self, grant: Grant) -> Result<(), EngineError> {
        match &self.acl {
            Some(acl) => Ok(acl.grant(grant).await?),
            None => Err(EngineError::Unsupported("ACL not enabled".to_string())),
        }
    }

    /// Check ACL access; with no ACL configured everything is allowed
    pub async fn check_access(&self, request: &AccessRequest) -> Result<bool, EngineError> {
        match &self.acl {
            Some(acl) => Ok(acl.check(request).await?),
            None => Ok(true),
        }
    }

    /// Revoke ACL access
    pub async fn revoke(&self, request: &RevokeRequest) -> Result<(), EngineError> {
        match &self.acl {
            Some(acl) => Ok(acl.revoke(request).await?),
            None => Err(EngineError::Unsupported("ACL not enabled".to_string())),
        }
    }

    /// All active grants for a subject
    pub async fn list_grants(&self, subject_oid: &str) -> Result<Vec<Grant>, EngineError> {
        match &self.acl {
            Some(acl) => Ok(acl.list_grants(subject_oid).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn authorize_append(&self, input: &AppendInput) -> Result<(), EngineError> {
        let Some(acl) = &self.acl else {
            return Ok(());
        };

        let requester = input
            .context
            .as_ref()
            .and_then(|context| context.get("requester"))
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                EngineError::AccessDenied(
                    "append requires a 'requester' string in the context".to_string(),
                )
            })?;

        let request = AccessRequest {
            requester_oid: requester.to_string(),
            resource_oid: input.chain_id.clone(),
            action: "append".to_string(),
        };

        if acl.check(&request).await? {
            Ok(())
        } else {
            Err(EngineError::AccessDenied(format!(
                "{requester} may not append to {}",
                input.chain_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::ModuleConfig;

    fn test_config() -> LedgerConfig {
        LedgerConfig::with_modules(
            "test-ledger".to_string(),
            vec![ModuleConfig::new(
                "oid".to_string(),
                "1.0.0".to_string(),
                serde_json::json!({}),
            )],
        )
    }

    #[tokio::test]
    async fn test_engine_new() {
        let engine = ChainEngine::new(test_config()).unwrap();

        assert_eq!(engine.id(), "test-ledger");
        assert!(engine.is_empty().await.unwrap());
        assert!(!engine.has_storage());
        assert_eq!(engine.module_names(), vec!["oid".to_string()]);
    }

    #[tokio::test]
    async fn test_engine_postgres_not_compiled() {
        let config = LedgerConfig::new("pg".to_string()).with_storage(StorageConfig::Postgres {
            connection_string: "postgres://localhost/strand".to_string(),
        });

        assert!(matches!(
            ChainEngine::new(config),
            Err(EngineError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_append_assigns_chain_fields() {
        let engine = ChainEngine::new(test_config()).unwrap();

        let first = engine
            .append(AppendInput::new("oid", "c1", serde_json::json!({"name": "alice"})))
            .await
            .unwrap();
        assert_eq!(first.index, 0);
        assert!(first.prev_hash.is_none());

        let second = engine
            .append(AppendInput::new("oid", "c1", serde_json::json!({"name": "bob"})))
            .await
            .unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.prev_hash, Some(first.hash));
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn test_append_unknown_module() {
        let engine = ChainEngine::new(test_config()).unwrap();

        let err = engine
            .append(AppendInput::new("unknown", "c1", serde_json::json!({})))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ModuleNotFound(_)));
        assert!(engine.get_head("c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_strict_validation_rejects_scalars() {
        let engine = ChainEngine::new(test_config()).unwrap();

        let err = engine
            .append(AppendInput::new("oid", "c1", serde_json::json!("bare string")))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_max_entries_cap() {
        let config = test_config().with_options(crate::config::EngineOptions {
            strict_validation: None,
            max_entries: Some(2),
            enable_metrics: None,
        });
        let engine = ChainEngine::new(config).unwrap();

        for i in 0..2 {
            engine
                .append(AppendInput::new("oid", "c1", serde_json::json!({"seq": i})))
                .await
                .unwrap();
        }

        let err = engine
            .append(AppendInput::new("oid", "c1", serde_json::json!({"seq": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded(2)));
    }

    #[tokio::test]
    async fn test_metrics_counters() {
        let config = test_config().with_options(crate::config::EngineOptions {
            strict_validation: None,
            max_entries: None,
            enable_metrics: Some(true),
        });
        let engine = ChainEngine::new(config).unwrap();

        engine
            .append(AppendInput::new("oid", "c1", serde_json::json!({})))
            .await
            .unwrap();
        engine.get_head("c1").await.unwrap();
        engine.query(QueryFilters::new()).await.unwrap();

        let snapshot = engine.metrics().unwrap();
        assert_eq!(snapshot.appends, 1);
        assert_eq!(snapshot.reads, 1);
        assert_eq!(snapshot.queries, 1);
    }
}
