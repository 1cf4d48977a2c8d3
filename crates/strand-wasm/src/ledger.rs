use std::sync::Arc;

use wasm_bindgen::prelude::*;

use strand_core::Hash;
use strand_engine::{
    AccessRequest, ChainEngine, ChainRange, Clock, RevokeRequest, StorageConfig, VerifyOptions,
};

use crate::error::to_js;
use crate::interop::{
    ApiAppendInput, ApiGrant, ApiLedgerConfig, ApiQueryFilters, ApiQueryResult, ApiRecord,
    ApiVerificationReport,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn warn(message: &str);
}

/// Host-backed clock; the system clock is unavailable on wasm32
struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// WASM-wrapped chain engine
#[wasm_bindgen]
pub struct WasmLedger {
    inner: Arc<ChainEngine>,
}

#[wasm_bindgen]
impl WasmLedger {
    /// Create a new ledger from configuration.
    ///
    /// Persistent storage variants are not available on this target: the
    /// ledger degrades to in-memory records and warns on the console.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmLedger, JsValue> {
        let api: ApiLedgerConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| to_js(format!("config error: {e}")))?;

        let mut native = api.into_native();
        native.validate().map_err(to_js)?;

        if !matches!(native.storage, StorageConfig::None) {
            warn(
                "strand: persistent storage is unavailable on this target; \
                 falling back to in-memory records (hasStorage() will be false)",
            );
            native.storage = StorageConfig::None;
        }

        let engine = ChainEngine::new(native)
            .map_err(to_js)?
            .with_clock(Arc::new(JsClock));

        Ok(WasmLedger {
            inner: Arc::new(engine),
        })
    }

    /// Ledger identifier
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.inner.id().to_string()
    }

    /// Append a record, returning its hash as hex
    pub async fn append(&self, input: JsValue) -> Result<String, JsValue> {
        let input: ApiAppendInput = serde_wasm_bindgen::from_value(input)
            .map_err(|e| to_js(format!("input error: {e}")))?;

        let record = self.inner.append(input.into()).await.map_err(to_js)?;
        Ok(record.hash.to_hex())
    }

    /// Append multiple records in order, returning their hashes.
    ///
    /// On failure, inputs before the failing one remain committed.
    #[wasm_bindgen(js_name = appendBatch)]
    pub async fn append_batch(&self, inputs: JsValue) -> Result<JsValue, JsValue> {
        let inputs: Vec<ApiAppendInput> = serde_wasm_bindgen::from_value(inputs)
            .map_err(|e| to_js(format!("inputs error: {e}")))?;

        let records = self
            .inner
            .append_batch(inputs.into_iter().map(Into::into).collect())
            .await
            .map_err(to_js)?;

        let hashes: Vec<String> = records.iter().map(|r| r.hash.to_hex()).collect();
        serde_wasm_bindgen::to_value(&hashes).map_err(to_js)
    }

    /// Get a record by hash; resolves to null when unknown
    pub async fn get(&self, hash: &str) -> Result<JsValue, JsValue> {
        let hash = Hash::from_hex(hash).map_err(to_js)?;

        match self.inner.get_by_hash(&hash).await.map_err(to_js)? {
            Some(record) => {
                serde_wasm_bindgen::to_value(&ApiRecord::from(record)).map_err(to_js)
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Records of one chain in index order
    #[wasm_bindgen(js_name = getChain)]
    pub async fn get_chain(&self, chain_id: &str) -> Result<JsValue, JsValue> {
        let records = self
            .inner
            .get_chain(chain_id, ChainRange::default())
            .await
            .map_err(to_js)?;

        let api: Vec<ApiRecord> = records.into_iter().map(ApiRecord::from).collect();
        serde_wasm_bindgen::to_value(&api).map_err(to_js)
    }

    /// Head of a chain; resolves to null for an unknown chain
    #[wasm_bindgen(js_name = getHead)]
    pub async fn get_head(&self, chain_id: &str) -> Result<JsValue, JsValue> {
        match self.inner.get_head(chain_id).await.map_err(to_js)? {
            Some(record) => {
                serde_wasm_bindgen::to_value(&ApiRecord::from(record)).map_err(to_js)
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Hash of a chain head as hex, or null for an unknown chain
    #[wasm_bindgen(js_name = latestHash)]
    pub async fn latest_hash(&self, chain_id: &str) -> Result<JsValue, JsValue> {
        Ok(match self.inner.latest_hash(chain_id).await.map_err(to_js)? {
            Some(hash) => JsValue::from_str(&hash.to_hex()),
            None => JsValue::NULL,
        })
    }

    /// Query records; resolves to `{records, total, hasMore}`
    pub async fn query(&self, filters: JsValue) -> Result<JsValue, JsValue> {
        let filters: ApiQueryFilters = if filters.is_undefined() || filters.is_null() {
            ApiQueryFilters::default()
        } else {
            serde_wasm_bindgen::from_value(filters)
                .map_err(|e| to_js(format!("filters error: {e}")))?
        };

        let result = self.inner.query(filters.into()).await.map_err(to_js)?;
        serde_wasm_bindgen::to_value(&ApiQueryResult::from(result)).map_err(to_js)
    }

    /// Verify a chain; resolves to `{valid, checked, firstInvalidIndex?, reason?}`
    pub async fn verify(&self, chain_id: &str) -> Result<JsValue, JsValue> {
        let report = self
            .inner
            .verify_chain(chain_id, VerifyOptions::default())
            .await
            .map_err(to_js)?;

        serde_wasm_bindgen::to_value(&ApiVerificationReport::from(report)).map_err(to_js)
    }

    /// Total committed records
    pub async fn length(&self) -> Result<f64, JsValue> {
        Ok(self.inner.len().await.map_err(to_js)? as f64)
    }

    /// Whether the ledger holds no records
    #[wasm_bindgen(js_name = isEmpty)]
    pub async fn is_empty(&self) -> Result<bool, JsValue> {
        self.inner.is_empty().await.map_err(to_js)
    }

    /// Whether records survive process restart (always false here)
    #[wasm_bindgen(js_name = hasStorage)]
    pub fn has_storage(&self) -> bool {
        self.inner.has_storage()
    }

    /// Verify durable storage; resolves to false with no durable storage
    #[wasm_bindgen(js_name = verifyStorage)]
    pub async fn verify_storage(&self) -> Result<bool, JsValue> {
        self.inner.verify_storage().await.map_err(to_js)
    }

    /// Registered module names
    #[wasm_bindgen(js_name = listModules)]
    pub fn list_modules(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.module_names()).unwrap_or(JsValue::NULL)
    }

    /// Grant ACL access
    pub async fn grant(&self, grant: JsValue) -> Result<(), JsValue> {
        let grant: ApiGrant = serde_wasm_bindgen::from_value(grant)
            .map_err(|e| to_js(format!("grant error: {e}")))?;

        self.inner
            .grant(grant.into_native(js_sys::Date::now() as u64))
            .await
            .map_err(to_js)
    }

    /// Check ACL access
    pub async fn check(
        &self,
        requester_oid: &str,
        resource_oid: &str,
        action: &str,
    ) -> Result<bool, JsValue> {
        self.inner
            .check_access(&AccessRequest {
                requester_oid: requester_oid.to_string(),
                resource_oid: resource_oid.to_string(),
                action: action.to_string(),
            })
            .await
            .map_err(to_js)
    }

    /// Revoke ACL access
    pub async fn revoke(
        &self,
        subject_oid: &str,
        resource_oid: &str,
        action: &str,
    ) -> Result<(), JsValue> {
        self.inner
            .revoke(&RevokeRequest {
                subject_oid: subject_oid.to_string(),
                resource_oid: resource_oid.to_string(),
                action: action.to_string(),
            })
            .await
            .map_err(to_js)
    }

    /// All active grants for a subject
    #[wasm_bindgen(js_name = listGrants)]
    pub async fn list_grants(&self, subject_oid: &str) -> Result<JsValue, JsValue> {
        let grants = self.inner.list_grants(subject_oid).await.map_err(to_js)?;
        let api: Vec<ApiGrant> = grants.into_iter().map(ApiGrant::from).collect();
        serde_wasm_bindgen::to_value(&api).map_err(to_js)
    }
}
