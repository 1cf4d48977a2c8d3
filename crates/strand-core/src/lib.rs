//! Strand Core - pure chain data model
//!
//! Record types, canonical hashing, chain verification and the module
//! runtime contract. This crate performs no I/O and runs on any target,
//! including wasm32.

/// Record types and structures
pub mod record;

/// Hash types and the injected hasher contract
pub mod hash;

/// Error types
pub mod error;

/// Canonical serialization (the hash input contract)
pub mod canonical;

/// Chain segment verification
pub mod verify;

/// Module system
pub mod module;

// Re-export commonly used types
pub use canonical::{canonical_bytes, compute_hash};
pub use error::CoreError;
pub use hash::{ContentHasher, Hash, HashError, Sha256Hasher};
pub use module::{ModuleConfig, ModuleError, ModuleRuntime};
pub use record::{Record, RecordDraft, RecordError};
pub use verify::{verify_segment, VerificationReport, VerifyFault};
