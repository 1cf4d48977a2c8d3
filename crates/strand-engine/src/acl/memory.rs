use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;

use crate::clock::{Clock, SystemClock};

use super::error::AclResult;
use super::trait_def::AclBackend;
use super::types::{owns_resource, AccessRequest, Grant, RevokeRequest};

/// Grants held by one subject, keyed by (resource, action)
type SubjectGrants = HashMap<(String, String), Grant>;

/// In-memory ACL implementation.
///
/// Each subject owns its own lock, so grant/revoke on the same subject
/// serialize (last writer wins) while different subjects proceed in
/// parallel.
pub struct InMemoryAcl {
    subjects: Mutex<HashMap<String, Arc<AsyncMutex<SubjectGrants>>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryAcl {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            subjects: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn subject_cell(&self, subject_oid: &str) -> Arc<AsyncMutex<SubjectGrants>> {
        let mut subjects = self
            .subjects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        subjects
            .entry(subject_oid.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(HashMap::new())))
            .clone()
    }
}

impl Default for InMemoryAcl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AclBackend for InMemoryAcl {
    async fn grant(&self, grant: Grant) -> AclResult<()> {
        grant.validate()?;

        let cell = self.subject_cell(&grant.subject_oid);
        let mut grants = cell.lock().await;
        grants.insert((grant.resource_oid.clone(), grant.action.clone()), grant);
        Ok(())
    }

    async fn check(&self, request: &AccessRequest) -> AclResult<bool> {
        if owns_resource(&request.requester_oid, &request.resource_oid) {
            return Ok(true);
        }

        let cell = self.subject_cell(&request.requester_oid);
        let grants = cell.lock().await;

        let key = (request.resource_oid.clone(), request.action.clone());
        match grants.get(&key) {
            Some(grant) => Ok(!grant.is_expired(self.clock.now_ms())),
            None => Ok(false),
        }
    }

    async fn revoke(&self, request: &RevokeRequest) -> AclResult<()> {
        let cell = self.subject_cell(&request.subject_oid);
        let mut grants = cell.lock().await;
        grants.remove(&(request.resource_oid.clone(), request.action.clone()));
        Ok(())
    }

    async fn list_grants(&self, subject_oid: &str) -> AclResult<Vec<Grant>> {
        let now = self.clock.now_ms();
        let cell = self.subject_cell(subject_oid);
        let grants = cell.lock().await;

        Ok(grants
            .values()
            .filter(|grant| !grant.is_expired(now))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(subject: &str, resource: &str, action: &str) -> Grant {
        Grant {
            subject_oid: subject.to_string(),
            resource_oid: resource.to_string(),
            action: action.to_string(),
            granted_by: "oid:acme:YWRtaW4".to_string(),
            granted_at: 1_000,
            expires_at: None,
            metadata: None,
        }
    }

    fn request(requester: &str, resource: &str, action: &str) -> AccessRequest {
        AccessRequest {
            requester_oid: requester.to_string(),
            resource_oid: resource.to_string(),
            action: action.to_string(),
        }
    }

    #[tokio::test]
    async fn test_grant_and_check() {
        let acl = InMemoryAcl::new();

        acl.grant(grant("alice", "doc1", "read")).await.unwrap();

        assert!(acl.check(&request("alice", "doc1", "read")).await.unwrap());
        assert!(!acl.check(&request("alice", "doc1", "write")).await.unwrap());
        assert!(!acl.check(&request("bob", "doc1", "read")).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let acl = InMemoryAcl::new();

        acl.grant(grant("alice", "doc1", "read")).await.unwrap();

        let revoke = RevokeRequest {
            subject_oid: "alice".to_string(),
            resource_oid: "doc1".to_string(),
            action: "read".to_string(),
        };
        acl.revoke(&revoke).await.unwrap();
        assert!(!acl.check(&request("alice", "doc1", "read")).await.unwrap());

        // Revoking again is a no-op
        acl.revoke(&revoke).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_replaces_tuple() {
        let acl = InMemoryAcl::new();

        acl.grant(grant("alice", "doc1", "read")).await.unwrap();

        let mut replacement = grant("alice", "doc1", "read");
        replacement.granted_by = "oid:acme:b3RoZXI".to_string();
        acl.grant(replacement.clone()).await.unwrap();

        let grants = acl.list_grants("alice").await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].granted_by, replacement.granted_by);
    }

    #[tokio::test]
    async fn test_expired_grants_filtered() {
        let acl = InMemoryAcl::new();

        let mut expired = grant("alice", "doc1", "read");
        expired.expires_at = Some(1); // long past
        acl.grant(expired).await.unwrap();
        acl.grant(grant("alice", "doc2", "read")).await.unwrap();

        assert!(!acl.check(&request("alice", "doc1", "read")).await.unwrap());

        let grants = acl.list_grants("alice").await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].resource_oid, "doc2");
    }

    #[tokio::test]
    async fn test_owner_rule() {
        let acl = InMemoryAcl::new();

        // No grant needed for resources rooted at the requester's OID
        assert!(acl
            .check(&request("oid:acme:YWxpY2U", "oid:acme:YWxpY2U/notes", "write"))
            .await
            .unwrap());
        assert!(!acl
            .check(&request("oid:acme:YWxpY2U", "oid:acme:Ym9i/notes", "write"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_rejects_empty_tuple() {
        let acl = InMemoryAcl::new();
        let mut bad = grant("", "doc1", "read");
        bad.subject_oid = String::new();

        assert!(acl.grant(bad).await.is_err());
    }
}
