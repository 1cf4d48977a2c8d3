use serde::{Deserialize, Serialize};

use strand_core::ModuleConfig;

/// Storage configuration
///
/// Tagged union on the wire: `{"type": "sqlite", "path": "..."}` and so
/// on. Invalid variants are rejected at config validation, not first use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// No persistence (in-memory only)
    #[default]
    None,

    /// SQLite storage
    Sqlite {
        /// Path to SQLite database file
        path: String,
    },

    /// PostgreSQL storage
    Postgres {
        /// PostgreSQL connection string
        connection_string: String,
    },
}

/// ACL (Access Control List) configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AclConfig {
    /// No ACL (all operations allowed)
    #[default]
    None,

    /// In-memory ACL
    InMemory,

    /// SQLite-persisted ACL
    Sqlite {
        /// Path to SQLite database file (may be shared with record storage)
        path: String,
    },
}

/// Optional engine tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EngineOptions {
    /// Require bodies to be JSON objects or arrays (default: on)
    pub strict_validation: Option<bool>,

    /// Reject appends once the store holds this many records
    pub max_entries: Option<u64>,

    /// Collect operation counters, exposed via `ChainEngine::metrics`
    pub enable_metrics: Option<bool>,
}

/// Ledger engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Ledger identifier
    pub id: String,

    /// Modules to load
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,

    /// Optional engine tuning
    #[serde(default)]
    pub options: Option<EngineOptions>,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// ACL configuration
    #[serde(default)]
    pub acl: AclConfig,
}

impl LedgerConfig {
    /// Create a new ledger config (in-memory only, no ACL)
    pub fn new(id: String) -> Self {
        Self {
            id,
            modules: Vec::new(),
            options: None,
            storage: StorageConfig::None,
            acl: AclConfig::None,
        }
    }

    /// Create a new ledger config with modules (in-memory only, no ACL)
    pub fn with_modules(id: String, modules: Vec<ModuleConfig>) -> Self {
        Self {
            id,
            modules,
            options: None,
            storage: StorageConfig::None,
            acl: AclConfig::None,
        }
    }

    /// Create a new ledger config with SQLite storage
    pub fn with_sqlite_storage(id: String, path: impl Into<String>) -> Self {
        Self {
            id,
            modules: Vec::new(),
            options: None,
            storage: StorageConfig::Sqlite { path: path.into() },
            acl: AclConfig::None,
        }
    }

    /// Add a module to the configuration
    pub fn add_module(mut self, module: ModuleConfig) -> Self {
        self.modules.push(module);
        self
    }

    /// Set engine options
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Set storage configuration
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Set ACL configuration
    pub fn with_acl(mut self, acl: AclConfig) -> Self {
        self.acl = acl;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.is_empty() {
            return Err(ConfigError::InvalidId(
                "ledger id cannot be empty".to_string(),
            ));
        }

        // Check for duplicate module IDs
        let mut module_ids = std::collections::HashSet::new();
        for module in &self.modules {
            if !module_ids.insert(module.id.clone()) {
                return Err(ConfigError::DuplicateModuleId(module.id.clone()));
            }
        }

        match &self.storage {
            StorageConfig::None => {}
            StorageConfig::Sqlite { path } => {
                if path.is_empty() {
                    return Err(ConfigError::InvalidStorage(
                        "sqlite storage requires a non-empty path".to_string(),
                    ));
                }
            }
            StorageConfig::Postgres { connection_string } => {
                if connection_string.is_empty() {
                    return Err(ConfigError::InvalidStorage(
                        "postgres storage requires a non-empty connection string".to_string(),
                    ));
                }
            }
        }

        if let AclConfig::Sqlite { path } = &self.acl {
            if path.is_empty() {
                return Err(ConfigError::InvalidStorage(
                    "sqlite acl requires a non-empty path".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Effective strict-validation flag (defaults to on)
    pub fn strict_validation(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.strict_validation)
            .unwrap_or(true)
    }

    /// Effective record cap, if any
    pub fn max_entries(&self) -> Option<u64> {
        self.options.as_ref().and_then(|o| o.max_entries)
    }

    /// Whether operation counters are collected
    pub fn metrics_enabled(&self) -> bool {
        self.options
            .as_ref()
            .and_then(|o| o.enable_metrics)
            .unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ledger ID: {0}")]
    InvalidId(String),

    #[error("Duplicate module ID: {0}")]
    DuplicateModuleId(String),

    #[error("Invalid storage config: {0}")]
    InvalidStorage(String),
}
