//! ACL layer
//!
//! Grant/check/revoke of `(subject, resource, action)` tuples. Grants are
//! persisted alongside records but are not hash-linked into any chain.
//! Operations on the same subject are serialized; across subjects they
//! run concurrently.

pub mod error;
pub mod memory;
pub mod trait_def;
pub mod types;

#[cfg(not(target_arch = "wasm32"))]
pub mod sqlite;

pub use error::{AclError, AclResult};
pub use memory::InMemoryAcl;
pub use trait_def::AclBackend;
pub use types::{owns_resource, AccessRequest, Grant, RevokeRequest};

#[cfg(not(target_arch = "wasm32"))]
pub use sqlite::SqliteAcl;
