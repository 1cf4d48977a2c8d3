use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// ACL Grant
///
/// A permission tuple authorising a subject to perform an action on a
/// resource. Granting the same `(subject, resource, action)` again
/// replaces the existing tuple.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grant {
    /// Subject OID (who has access)
    pub subject_oid: String,

    /// Resource OID (what they can access)
    pub resource_oid: String,

    /// Action/permission (e.g., "read", "append")
    pub action: String,

    /// Who granted this access
    pub granted_by: String,

    /// When this grant was created (unix milliseconds)
    pub granted_at: u64,

    /// Optional expiration (unix milliseconds)
    pub expires_at: Option<u64>,

    /// Optional metadata
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Grant {
    /// Whether the grant has lapsed at time `now_ms`
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at.map_or(false, |expires| expires < now_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), super::AclError> {
        if self.subject_oid.is_empty() || self.resource_oid.is_empty() || self.action.is_empty() {
            return Err(super::AclError::InvalidGrant(
                "subject, resource and action must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Access check parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Requester OID (who is asking)
    pub requester_oid: String,

    /// Resource OID (what they want to access)
    pub resource_oid: String,

    /// Action/permission
    pub action: String,
}

/// Revocation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeRequest {
    /// Subject OID (whose access to revoke)
    pub subject_oid: String,

    /// Resource OID (what to revoke access to)
    pub resource_oid: String,

    /// Action/permission to revoke
    pub action: String,
}

/// Resource-owner rule: a subject is always permitted on resources rooted
/// at its own OID. A resource is rooted at an OID when it equals the OID
/// or extends it past a `/` or `:` separator.
pub fn owns_resource(subject_oid: &str, resource_oid: &str) -> bool {
    if subject_oid.is_empty() {
        return false;
    }
    match resource_oid.strip_prefix(subject_oid) {
        Some("") => true,
        Some(rest) => rest.starts_with('/') || rest.starts_with(':'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owns_resource() {
        assert!(owns_resource("oid:acme:YWxpY2U", "oid:acme:YWxpY2U"));
        assert!(owns_resource("oid:acme:YWxpY2U", "oid:acme:YWxpY2U/docs"));
        assert!(owns_resource("oid:acme:YWxpY2U", "oid:acme:YWxpY2U:inbox"));

        assert!(!owns_resource("oid:acme:YWxpY2U", "oid:acme:Ym9i"));
        // Shared prefix without a separator is not ownership
        assert!(!owns_resource("oid:acme:YWxpY2U", "oid:acme:YWxpY2Ux"));
        assert!(!owns_resource("", "oid:acme:YWxpY2U"));
    }

    #[test]
    fn test_grant_expiry() {
        let mut grant = Grant {
            subject_oid: "s".to_string(),
            resource_oid: "r".to_string(),
            action: "read".to_string(),
            granted_by: "admin".to_string(),
            granted_at: 1_000,
            expires_at: None,
            metadata: None,
        };

        assert!(!grant.is_expired(u64::MAX));

        grant.expires_at = Some(2_000);
        assert!(!grant.is_expired(2_000));
        assert!(grant.is_expired(2_001));
    }
}
