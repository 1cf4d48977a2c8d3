//! Strand Engine - async runtime around strand-core
//!
//! Per-chain serialized appends, pluggable record stores, module dispatch
//! and the ACL layer. Reads go straight to the store; the engine holds no
//! record state of its own.

/// Chain engine implementation
pub mod engine;

/// Engine configuration
pub mod config;

/// Module registry
pub mod registry;

/// Query API
pub mod query;

/// Error types
pub mod error;

/// Record store contract and backends
pub mod store;

/// ACL layer
pub mod acl;

/// Injected time source
pub mod clock;

/// Operation counters
pub mod metrics;

mod serializer;

/// Blocking native facade
#[cfg(not(target_arch = "wasm32"))]
pub mod facade;

// Re-export commonly used types
pub use acl::{AccessRequest, AclBackend, AclError, Grant, InMemoryAcl, RevokeRequest};
pub use clock::{Clock, SystemClock};
pub use config::{AclConfig, EngineOptions, LedgerConfig, StorageConfig};
pub use engine::{AppendInput, ChainEngine, VerifyOptions};
pub use error::EngineError;
pub use metrics::MetricsSnapshot;
pub use query::{QueryFilters, QueryResult, DEFAULT_QUERY_LIMIT};
pub use store::{ChainRange, MemoryStore, RecordFilter, RecordStore, StoreError};

#[cfg(not(target_arch = "wasm32"))]
pub use facade::Ledger;
#[cfg(not(target_arch = "wasm32"))]
pub use store::SqliteStore;
