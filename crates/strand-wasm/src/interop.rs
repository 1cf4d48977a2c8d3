//! Interop shapes crossing the JS boundary
//!
//! Everything here is camelCase on the wire (`chainId`, `hasMore`,
//! `connectionString`); conversion to the engine's native snake_case
//! types happens in this module and nowhere else. Enum payloads are
//! tagged unions (`{"type": "sqlite", "path": "..."}`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use strand_core::{ModuleConfig, Record, VerificationReport};
use strand_engine::{
    AclConfig, AppendInput, EngineOptions, Grant, LedgerConfig, QueryFilters, QueryResult,
    StorageConfig,
};

/// Record as seen from JS
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecord {
    pub hash: String,
    pub chain_id: String,
    pub index: u64,
    pub prev_hash: Option<String>,
    pub created_at: u64,
    pub module: String,
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl From<Record> for ApiRecord {
    fn from(record: Record) -> Self {
        Self {
            hash: record.hash.to_hex(),
            chain_id: record.chain_id,
            index: record.index,
            prev_hash: record.prev_hash.map(|h| h.to_hex()),
            created_at: record.created_at,
            module: record.module,
            body: record.body,
            context: record.context,
        }
    }
}

/// Query result as seen from JS (`has_more` ↔ `hasMore`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiQueryResult {
    pub records: Vec<ApiRecord>,
    pub total: usize,
    pub has_more: bool,
}

impl From<QueryResult> for ApiQueryResult {
    fn from(result: QueryResult) -> Self {
        Self {
            records: result.records.into_iter().map(ApiRecord::from).collect(),
            total: result.total,
            has_more: result.has_more,
        }
    }
}

/// Verification report as seen from JS; the fault becomes a reason string
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVerificationReport {
    pub valid: bool,
    pub checked: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<VerificationReport> for ApiVerificationReport {
    fn from(report: VerificationReport) -> Self {
        Self {
            valid: report.valid,
            checked: report.checked,
            first_invalid_index: report.first_invalid_index,
            reason: report.fault.map(|f| f.as_str()),
        }
    }
}

/// Append input as seen from JS
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAppendInput {
    pub module: String,
    pub chain_id: String,
    pub body: Value,
    #[serde(default)]
    pub context: Option<Value>,
}

impl From<ApiAppendInput> for AppendInput {
    fn from(input: ApiAppendInput) -> Self {
        AppendInput {
            module: input.module,
            chain_id: input.chain_id,
            body: input.body,
            context: input.context,
        }
    }
}

/// Query filters as seen from JS
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiQueryFilters {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub created_from: Option<u64>,
    #[serde(default)]
    pub created_to: Option<u64>,
    #[serde(default)]
    pub body_filters: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl From<ApiQueryFilters> for QueryFilters {
    fn from(filters: ApiQueryFilters) -> Self {
        QueryFilters {
            chain_id: filters.chain_id,
            module: filters.module,
            created_from: filters.created_from,
            created_to: filters.created_to,
            body_filters: filters.body_filters.unwrap_or_default(),
            limit: filters.limit,
            offset: filters.offset,
        }
    }
}

/// Storage config as seen from JS: `{type: "none" | "sqlite" | "postgres"}`
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ApiStorageConfig {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Sqlite { path: String },
    #[serde(rename_all = "camelCase")]
    Postgres { connection_string: String },
}

impl From<ApiStorageConfig> for StorageConfig {
    fn from(storage: ApiStorageConfig) -> Self {
        match storage {
            ApiStorageConfig::None => StorageConfig::None,
            ApiStorageConfig::Sqlite { path } => StorageConfig::Sqlite { path },
            ApiStorageConfig::Postgres { connection_string } => {
                StorageConfig::Postgres { connection_string }
            }
        }
    }
}

impl ApiStorageConfig {
    pub fn is_persistent(&self) -> bool {
        !matches!(self, ApiStorageConfig::None)
    }
}

/// ACL config as seen from JS
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ApiAclConfig {
    #[default]
    None,
    InMemory,
}

impl From<ApiAclConfig> for AclConfig {
    fn from(acl: ApiAclConfig) -> Self {
        match acl {
            ApiAclConfig::None => AclConfig::None,
            ApiAclConfig::InMemory => AclConfig::InMemory,
        }
    }
}

/// Engine options as seen from JS
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiEngineOptions {
    #[serde(default)]
    pub strict_validation: Option<bool>,
    #[serde(default)]
    pub max_entries: Option<u64>,
    #[serde(default)]
    pub enable_metrics: Option<bool>,
}

/// Module config as seen from JS
#[derive(Debug, Clone, Deserialize)]
pub struct ApiModuleConfig {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub config: Value,
}

/// Ledger config as seen from JS
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLedgerConfig {
    pub id: String,
    #[serde(default)]
    pub modules: Vec<ApiModuleConfig>,
    #[serde(default)]
    pub options: Option<ApiEngineOptions>,
    #[serde(default)]
    pub storage: ApiStorageConfig,
    #[serde(default)]
    pub acl: ApiAclConfig,
}

impl ApiLedgerConfig {
    pub fn into_native(self) -> LedgerConfig {
        LedgerConfig {
            id: self.id,
            modules: self
                .modules
                .into_iter()
                .map(|m| ModuleConfig::new(m.id, m.version, m.config))
                .collect(),
            options: self.options.map(|o| EngineOptions {
                strict_validation: o.strict_validation,
                max_entries: o.max_entries,
                enable_metrics: o.enable_metrics,
            }),
            storage: self.storage.into(),
            acl: self.acl.into(),
        }
    }
}

/// Grant as seen from JS
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGrant {
    pub subject_oid: String,
    pub resource_oid: String,
    pub action: String,
    pub granted_by: String,
    #[serde(default)]
    pub granted_at: Option<u64>,
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub metadata: Option<std::collections::HashMap<String, Value>>,
}

impl ApiGrant {
    /// Convert to a native grant, stamping `granted_at` when omitted
    pub fn into_native(self, now_ms: u64) -> Grant {
        Grant {
            subject_oid: self.subject_oid,
            resource_oid: self.resource_oid,
            action: self.action,
            granted_by: self.granted_by,
            granted_at: self.granted_at.unwrap_or(now_ms),
            expires_at: self.expires_at,
            metadata: self.metadata,
        }
    }
}

impl From<Grant> for ApiGrant {
    fn from(grant: Grant) -> Self {
        Self {
            subject_oid: grant.subject_oid,
            resource_oid: grant.resource_oid,
            action: grant.action,
            granted_by: grant.granted_by,
            granted_at: Some(grant.granted_at),
            expires_at: grant.expires_at,
            metadata: grant.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_config_camel_case() {
        let config: ApiLedgerConfig = serde_json::from_value(serde_json::json!({
            "id": "wire-ledger",
            "modules": [{"id": "oid", "version": "1.0.0"}],
            "options": {"strictValidation": false, "maxEntries": 100},
            "storage": {"type": "sqlite", "path": "ledger.db"},
        }))
        .unwrap();

        let native = config.into_native();
        assert_eq!(native.id, "wire-ledger");
        assert_eq!(native.modules.len(), 1);
        assert!(!native.strict_validation());
        assert_eq!(native.max_entries(), Some(100));
        assert_eq!(
            native.storage,
            StorageConfig::Sqlite {
                path: "ledger.db".to_string()
            }
        );
    }

    #[test]
    fn test_postgres_wire_shape() {
        let storage: ApiStorageConfig = serde_json::from_value(serde_json::json!({
            "type": "postgres",
            "connectionString": "postgres://localhost/strand",
        }))
        .unwrap();

        assert!(storage.is_persistent());
        assert!(matches!(
            StorageConfig::from(storage),
            StorageConfig::Postgres { .. }
        ));
    }

    #[test]
    fn test_query_result_has_more_casing() {
        let result = ApiQueryResult {
            records: Vec::new(),
            total: 7,
            has_more: true,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.get("hasMore"), Some(&serde_json::json!(true)));
        assert!(json.get("has_more").is_none());
    }
}
