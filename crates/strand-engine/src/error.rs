use thiserror::Error;

use crate::acl::AclError;
use crate::config::ConfigError;
use crate::store::StoreError;

/// Engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Core error (from strand-core)
    #[error("Core error: {0}")]
    Core(#[from] strand_core::CoreError),

    /// Record error (from strand-core)
    #[error("Record error: {0}")]
    Record(#[from] strand_core::RecordError),

    /// No runtime registered under the requested module name
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// Module already registered
    #[error("Module already registered: {0}")]
    ModuleAlreadyRegistered(String),

    /// Body rejected by the module's validator
    #[error("Validation failed in module '{module}': {detail}")]
    Validation { module: String, detail: String },

    /// An identical logical record is already committed
    #[error("Duplicate record: already committed as {0}")]
    DuplicateRecord(String),

    /// Uniqueness invariant violated despite the chain serializer; only
    /// possible with corrupted or externally-mutated storage
    #[error("Storage consistency violation: {0}")]
    StorageConsistency(String),

    /// Transient storage failure; the caller may retry, the write outcome
    /// is undefined until the next successful read
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// Batch failure at input `index`; earlier inputs remain committed
    #[error("Batch input {index} failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<EngineError>,
    },

    /// Access denied (ACL)
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// ACL error
    #[error("ACL error: {0}")]
    Acl(#[from] AclError),

    /// Ledger reached its configured record cap
    #[error("Capacity exceeded: ledger is limited to {0} records")]
    CapacityExceeded(u64),

    /// Feature not available in this build or configuration
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Runtime bootstrap failure (native facade)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => EngineError::StorageUnavailable(message),
            other => EngineError::Storage(other),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EngineError>;
