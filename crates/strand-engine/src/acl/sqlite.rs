//! SQLite-persisted ACL backend
//!
//! Grants live in a `grants` table keyed by the full tuple, so the same
//! database file can hold records and grants side by side. Grants are not
//! hash-linked; `INSERT OR REPLACE` gives upsert semantics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::clock::{Clock, SystemClock};

use super::error::{AclError, AclResult};
use super::trait_def::AclBackend;
use super::types::{owns_resource, AccessRequest, Grant, RevokeRequest};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS grants (
    subject_oid  TEXT NOT NULL,
    resource_oid TEXT NOT NULL,
    action       TEXT NOT NULL,
    granted_by   TEXT NOT NULL,
    granted_at   INTEGER NOT NULL,
    expires_at   INTEGER,
    metadata     TEXT,
    PRIMARY KEY (subject_oid, resource_oid, action)
);
CREATE INDEX IF NOT EXISTS grants_subject ON grants (subject_oid);
";

/// SQLite ACL backend
pub struct SqliteAcl {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteAcl {
    /// Open (creating if needed) the grants table at `path`
    pub fn open(path: &str) -> AclResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| AclError::Backend(format!("failed to open database: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| AclError::Backend(format!("failed to enable WAL: {e}")))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| AclError::Backend(format!("schema setup failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn row_to_grant(row: &Row) -> rusqlite::Result<(Grant, Option<String>)> {
        Ok((
            Grant {
                subject_oid: row.get(0)?,
                resource_oid: row.get(1)?,
                action: row.get(2)?,
                granted_by: row.get(3)?,
                granted_at: row.get::<_, i64>(4)? as u64,
                expires_at: row.get::<_, Option<i64>>(5)?.map(|v| v as u64),
                metadata: None,
            },
            row.get::<_, Option<String>>(6)?,
        ))
    }

    fn decode(pair: (Grant, Option<String>)) -> AclResult<Grant> {
        let (mut grant, metadata) = pair;
        if let Some(raw) = metadata {
            let parsed: HashMap<String, serde_json::Value> = serde_json::from_str(&raw)
                .map_err(|e| AclError::Serialization(format!("bad grant metadata: {e}")))?;
            grant.metadata = Some(parsed);
        }
        Ok(grant)
    }
}

#[async_trait]
impl AclBackend for SqliteAcl {
    async fn grant(&self, grant: Grant) -> AclResult<()> {
        grant.validate()?;

        let metadata = grant
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AclError::Serialization(format!("failed to encode metadata: {e}")))?;

        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO grants \
             (subject_oid, resource_oid, action, granted_by, granted_at, expires_at, metadata) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                grant.subject_oid,
                grant.resource_oid,
                grant.action,
                grant.granted_by,
                grant.granted_at as i64,
                grant.expires_at.map(|v| v as i64),
                metadata,
            ],
        )
        .map_err(|e| AclError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn check(&self, request: &AccessRequest) -> AclResult<bool> {
        if owns_resource(&request.requester_oid, &request.resource_oid) {
            return Ok(true);
        }

        let conn = self.lock();
        let pair = conn
            .query_row(
                "SELECT subject_oid, resource_oid, action, granted_by, granted_at, expires_at, metadata \
                 FROM grants WHERE subject_oid = ?1 AND resource_oid = ?2 AND action = ?3",
                params![request.requester_oid, request.resource_oid, request.action],
                Self::row_to_grant,
            )
            .optional()
            .map_err(|e| AclError::Backend(e.to_string()))?;

        match pair {
            Some(pair) => {
                let grant = Self::decode(pair)?;
                Ok(!grant.is_expired(self.clock.now_ms()))
            }
            None => Ok(false),
        }
    }

    async fn revoke(&self, request: &RevokeRequest) -> AclResult<()> {
        let conn = self.lock();
        conn.execute(
            "DELETE FROM grants WHERE subject_oid = ?1 AND resource_oid = ?2 AND action = ?3",
            params![request.subject_oid, request.resource_oid, request.action],
        )
        .map_err(|e| AclError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_grants(&self, subject_oid: &str) -> AclResult<Vec<Grant>> {
        let now = self.clock.now_ms();
        let conn = self.lock();

        let mut stmt = conn
            .prepare(
                "SELECT subject_oid, resource_oid, action, granted_by, granted_at, expires_at, metadata \
                 FROM grants WHERE subject_oid = ?1",
            )
            .map_err(|e| AclError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params![subject_oid], Self::row_to_grant)
            .map_err(|e| AclError::Backend(e.to_string()))?;

        let mut grants = Vec::new();
        for row in rows {
            let grant = Self::decode(row.map_err(|e| AclError::Backend(e.to_string()))?)?;
            if !grant.is_expired(now) {
                grants.push(grant);
            }
        }
        Ok(grants)
    }
}
