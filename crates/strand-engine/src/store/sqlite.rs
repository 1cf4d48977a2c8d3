//! SQLite record store
//!
//! WAL-mode database where the `records` table is the authoritative
//! uniqueness enforcement point: `hash` is the primary key and
//! `(chain_id, idx)` carries a unique index, so a concurrent duplicate
//! append surfaces as a constraint violation instead of a torn chain.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};

use strand_core::{verify_segment, ContentHasher, Hash, Record};

use super::{ChainRange, RecordFilter, RecordStore, StoreError, StoreResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    hash       TEXT PRIMARY KEY,
    chain_id   TEXT NOT NULL,
    idx        INTEGER NOT NULL,
    prev_hash  TEXT,
    created_at INTEGER NOT NULL,
    module     TEXT NOT NULL,
    payload    TEXT NOT NULL,
    UNIQUE (chain_id, idx)
);
CREATE INDEX IF NOT EXISTS records_chain ON records (chain_id);
CREATE INDEX IF NOT EXISTS records_module ON records (module);
CREATE INDEX IF NOT EXISTS records_created ON records (created_at);
";

// SQLite extended result codes for the two uniqueness constraints
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/// SQLite-backed record store
///
/// The connection is guarded by a mutex; statements are short-lived and
/// the store is shared across tasks behind an `Arc<dyn RecordStore>`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteStore {
    /// Open (creating if needed) a store at `path`.
    ///
    /// Use `":memory:"` for an ephemeral database. Parent directories are
    /// created, WAL mode is enabled and the schema is applied.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        if path_str != ":memory:" {
            if let Some(parent) = Path::new(&path_str).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let conn = Connection::open(&path_str)
            .map_err(|e| StoreError::Backend(format!("failed to open database: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| StoreError::Backend(format!("failed to enable WAL: {e}")))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Backend(format!("schema setup failed: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path_str,
        })
    }

    /// Filesystem path this store was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn decode(payload: &str) -> StoreResult<Record> {
        serde_json::from_str(payload)
            .map_err(|e| StoreError::Serialization(format!("failed to decode record: {e}")))
    }

    fn map_put_error(err: rusqlite::Error, record: &Record) -> StoreError {
        if let rusqlite::Error::SqliteFailure(ffi, _) = &err {
            match ffi.code {
                ErrorCode::ConstraintViolation => {
                    return match ffi.extended_code {
                        SQLITE_CONSTRAINT_PRIMARYKEY => {
                            StoreError::DuplicateHash(record.hash.to_hex())
                        }
                        SQLITE_CONSTRAINT_UNIQUE => StoreError::DuplicateChainIndex {
                            chain_id: record.chain_id.clone(),
                            index: record.index,
                        },
                        _ => StoreError::Backend(err.to_string()),
                    };
                }
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    return StoreError::Unavailable(err.to_string());
                }
                _ => {}
            }
        }
        StoreError::Backend(err.to_string())
    }

    fn chain_ids(conn: &Connection) -> StoreResult<Vec<String>> {
        let mut stmt = conn
            .prepare("SELECT DISTINCT chain_id FROM records")
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| StoreError::Backend(e.to_string()))?);
        }
        Ok(ids)
    }

    fn load_chain(
        conn: &Connection,
        chain_id: &str,
        range: &ChainRange,
    ) -> StoreResult<Vec<Record>> {
        let order = if range.reverse { "DESC" } else { "ASC" };
        let sql = format!(
            "SELECT payload FROM records WHERE chain_id = ?1 \
             ORDER BY idx {order} LIMIT ?2 OFFSET ?3"
        );

        let limit = range.limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params![chain_id, limit, range.offset as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let payload = row.map_err(|e| StoreError::Backend(e.to_string()))?;
            records.push(Self::decode(&payload)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn put(&self, record: &Record) -> StoreResult<()> {
        let payload = serde_json::to_string(record)
            .map_err(|e| StoreError::Serialization(format!("failed to encode record: {e}")))?;

        let conn = self.lock();
        conn.execute(
            "INSERT INTO records (hash, chain_id, idx, prev_hash, created_at, module, payload) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.hash.to_hex(),
                record.chain_id,
                record.index as i64,
                record.prev_hash.map(|h| h.to_hex()),
                record.created_at as i64,
                record.module,
                payload,
            ],
        )
        .map_err(|e| Self::map_put_error(e, record))?;

        Ok(())
    }

    async fn get_by_hash(&self, hash: &Hash) -> StoreResult<Option<Record>> {
        let conn = self.lock();

        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM records WHERE hash = ?1",
                params![hash.to_hex()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        payload.map(|p| Self::decode(&p)).transpose()
    }

    async fn get_chain(&self, chain_id: &str, range: &ChainRange) -> StoreResult<Vec<Record>> {
        let conn = self.lock();
        Self::load_chain(&conn, chain_id, range)
    }

    async fn get_head(&self, chain_id: &str) -> StoreResult<Option<Record>> {
        let conn = self.lock();

        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM records WHERE chain_id = ?1 ORDER BY idx DESC LIMIT 1",
                params![chain_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        payload.map(|p| Self::decode(&p)).transpose()
    }

    async fn find(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref chain_id) = filter.chain_id {
            args.push(Box::new(chain_id.clone()));
            clauses.push(format!("chain_id = ?{}", args.len()));
        }
        if let Some(ref module) = filter.module {
            args.push(Box::new(module.clone()));
            clauses.push(format!("module = ?{}", args.len()));
        }
        if let Some(from) = filter.created_from {
            args.push(Box::new(from as i64));
            clauses.push(format!("created_at >= ?{}", args.len()));
        }
        if let Some(to) = filter.created_to {
            args.push(Box::new(to as i64));
            clauses.push(format!("created_at <= ?{}", args.len()));
        }

        let mut sql = String::from("SELECT payload FROM records");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(if filter.chain_id.is_some() {
            " ORDER BY idx ASC"
        } else {
            " ORDER BY created_at ASC, hash ASC"
        });

        let conn = self.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(args.iter().map(|a| a.as_ref())), |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let payload = row.map_err(|e| StoreError::Backend(e.to_string()))?;
            records.push(Self::decode(&payload)?);
        }
        Ok(records)
    }

    async fn count(&self) -> StoreResult<u64> {
        let conn = self.lock();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(count as u64)
    }

    async fn verify_integrity(&self, hasher: &dyn ContentHasher) -> StoreResult<()> {
        let conn = self.lock();

        for chain_id in Self::chain_ids(&conn)? {
            let records = Self::load_chain(&conn, &chain_id, &ChainRange::default())?;
            let report = verify_segment(&records, 0, None, hasher);
            if !report.valid {
                return Err(StoreError::IntegrityFailed(format!(
                    "chain {} invalid at index {:?}: {:?}",
                    chain_id, report.first_invalid_index, report.fault
                )));
            }
        }

        Ok(())
    }

    fn is_durable(&self) -> bool {
        self.path != ":memory:"
    }
}
