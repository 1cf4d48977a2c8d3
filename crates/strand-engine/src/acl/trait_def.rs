use async_trait::async_trait;

use super::error::AclResult;
use super::types::{AccessRequest, Grant, RevokeRequest};

/// ACL Backend trait
///
/// Defines the interface for Access Control List implementations.
/// Mutations on the same subject are serialized by the backend;
/// last writer wins for the same tuple.
#[async_trait]
pub trait AclBackend: Send + Sync {
    /// Grant access to a resource, replacing any existing tuple
    async fn grant(&self, grant: Grant) -> AclResult<()>;

    /// Check if access is allowed (non-expired grant or resource owner)
    async fn check(&self, request: &AccessRequest) -> AclResult<bool>;

    /// Revoke access to a resource; idempotent
    async fn revoke(&self, request: &RevokeRequest) -> AclResult<()>;

    /// All active (non-expired) grants held by a subject
    async fn list_grants(&self, subject_oid: &str) -> AclResult<Vec<Grant>>;
}
