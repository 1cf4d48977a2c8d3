//! In-memory record store
//!
//! The default backend for embedded targets and tests. Chains are kept as
//! index-keyed BTreeMaps so range reads come out ordered without sorting.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use strand_core::{verify_segment, ContentHasher, Hash, Record};

use super::{ChainRange, RecordFilter, RecordStore, StoreError, StoreResult};

/// In-memory record store, shareable across tasks via its internal `Arc`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    by_hash: HashMap<Hash, Record>,
    chains: HashMap<String, BTreeMap<u64, Hash>>,
}

impl MemoryStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a stored record in place, bypassing all uniqueness checks.
    ///
    /// Exists so corruption tests can tamper with committed state.
    #[doc(hidden)]
    pub async fn overwrite(&self, record: Record) {
        let mut inner = self.inner.write().await;
        inner
            .chains
            .entry(record.chain_id.clone())
            .or_default()
            .insert(record.index, record.hash);
        inner.by_hash.insert(record.hash, record);
    }
}

impl MemoryInner {
    fn chain_records(&self, chain_id: &str) -> StoreResult<Vec<Record>> {
        let Some(chain) = self.chains.get(chain_id) else {
            return Ok(Vec::new());
        };

        chain
            .values()
            .map(|hash| {
                self.by_hash.get(hash).cloned().ok_or_else(|| {
                    StoreError::Backend(format!("chain index points at missing record {hash}"))
                })
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, record: &Record) -> StoreResult<()> {
        let mut inner = self.inner.write().await;

        if inner.by_hash.contains_key(&record.hash) {
            return Err(StoreError::DuplicateHash(record.hash.to_hex()));
        }

        let slot_taken = inner
            .chains
            .get(&record.chain_id)
            .map_or(false, |chain| chain.contains_key(&record.index));
        if slot_taken {
            return Err(StoreError::DuplicateChainIndex {
                chain_id: record.chain_id.clone(),
                index: record.index,
            });
        }

        inner
            .chains
            .entry(record.chain_id.clone())
            .or_default()
            .insert(record.index, record.hash);
        inner.by_hash.insert(record.hash, record.clone());

        Ok(())
    }

    async fn get_by_hash(&self, hash: &Hash) -> StoreResult<Option<Record>> {
        let inner = self.inner.read().await;
        Ok(inner.by_hash.get(hash).cloned())
    }

    async fn get_chain(&self, chain_id: &str, range: &ChainRange) -> StoreResult<Vec<Record>> {
        let inner = self.inner.read().await;
        let mut records = inner.chain_records(chain_id)?;

        if range.reverse {
            records.reverse();
        }

        let iter = records.into_iter().skip(range.offset as usize);
        Ok(match range.limit {
            Some(limit) => iter.take(limit as usize).collect(),
            None => iter.collect(),
        })
    }

    async fn get_head(&self, chain_id: &str) -> StoreResult<Option<Record>> {
        let inner = self.inner.read().await;

        let Some(chain) = inner.chains.get(chain_id) else {
            return Ok(None);
        };

        match chain.values().next_back() {
            Some(hash) => inner
                .by_hash
                .get(hash)
                .cloned()
                .map(Some)
                .ok_or_else(|| {
                    StoreError::Backend(format!("chain head points at missing record {hash}"))
                }),
            None => Ok(None),
        }
    }

    async fn find(&self, filter: &RecordFilter) -> StoreResult<Vec<Record>> {
        let inner = self.inner.read().await;

        let mut records: Vec<Record> = inner
            .by_hash
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();

        if filter.chain_id.is_some() {
            records.sort_by_key(|record| record.index);
        } else {
            records.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.hash.as_bytes().cmp(b.hash.as_bytes()))
            });
        }

        Ok(records)
    }

    async fn count(&self) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.by_hash.len() as u64)
    }

    async fn verify_integrity(&self, hasher: &dyn ContentHasher) -> StoreResult<()> {
        let inner = self.inner.read().await;

        for chain_id in inner.chains.keys() {
            let records = inner.chain_records(chain_id)?;
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
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::{RecordDraft, Sha256Hasher};

    fn record(chain_id: &str, index: u64, prev_hash: Option<Hash>, created_at: u64) -> Record {
        RecordDraft {
            chain_id: chain_id.to_string(),
            index,
            prev_hash,
            created_at,
            module: "oid".to_string(),
            body: serde_json::json!({"seq": index}),
            context: None,
        }
        .seal(&Sha256Hasher)
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get_by_hash() {
        let store = MemoryStore::new();
        let r = record("c1", 0, None, 1_000);

        store.put(&r).await.unwrap();

        let loaded = store.get_by_hash(&r.hash).await.unwrap();
        assert_eq!(loaded, Some(r));
    }

    #[tokio::test]
    async fn test_duplicate_hash_rejected() {
        let store = MemoryStore::new();
        let r = record("c1", 0, None, 1_000);

        store.put(&r).await.unwrap();
        let err = store.put(&r).await.unwrap_err();

        assert!(matches!(err, StoreError::DuplicateHash(_)));
    }

    #[tokio::test]
    async fn test_duplicate_chain_index_rejected() {
        let store = MemoryStore::new();
        let a = record("c1", 0, None, 1_000);
        // Same slot, different content
        let b = record("c1", 0, None, 2_000);

        store.put(&a).await.unwrap();
        let err = store.put(&b).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::DuplicateChainIndex { index: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_get_chain_ordering_and_range() {
        let store = MemoryStore::new();
        let mut prev = None;
        for i in 0..5 {
            let r = record("c1", i, prev, 1_000 + i);
            prev = Some(r.hash);
            store.put(&r).await.unwrap();
        }

        let all = store.get_chain("c1", &ChainRange::default()).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].index + 1 == w[1].index));

        let windowed = store
            .get_chain("c1", &ChainRange::window(1, 2))
            .await
            .unwrap();
        assert_eq!(
            windowed.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let reversed = store
            .get_chain(
                "c1",
                &ChainRange {
                    reverse: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(reversed[0].index, 4);

        let unknown = store.get_chain("nope", &ChainRange::default()).await.unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn test_get_head() {
        let store = MemoryStore::new();
        assert!(store.get_head("c1").await.unwrap().is_none());

        let a = record("c1", 0, None, 1_000);
        store.put(&a).await.unwrap();
        let b = record("c1", 1, Some(a.hash), 1_001);
        store.put(&b).await.unwrap();

        let head = store.get_head("c1").await.unwrap().unwrap();
        assert_eq!(head.index, 1);
    }

    #[tokio::test]
    async fn test_find_filters_and_ordering() {
        let store = MemoryStore::new();
        let a = record("c1", 0, None, 3_000);
        let b = record("c2", 0, None, 1_000);
        store.put(&a).await.unwrap();
        store.put(&b).await.unwrap();

        let all = store.find(&RecordFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        // created_at ordering when no chain is pinned
        assert_eq!(all[0].created_at, 1_000);

        let filtered = store
            .find(&RecordFilter {
                chain_id: Some("c1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);

        let ranged = store
            .find(&RecordFilter {
                created_from: Some(2_000),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].chain_id, "c1");
    }

    #[tokio::test]
    async fn test_verify_integrity_catches_overwrite() {
        let store = MemoryStore::new();
        let a = record("c1", 0, None, 1_000);
        store.put(&a).await.unwrap();
        let b = record("c1", 1, Some(a.hash), 1_001);
        store.put(&b).await.unwrap();

        store.verify_integrity(&Sha256Hasher).await.unwrap();

        let mut tampered = b.clone();
        tampered.prev_hash = Some(Hash::zero());
        store.overwrite(tampered).await;

        let err = store.verify_integrity(&Sha256Hasher).await.unwrap_err();
        assert!(matches!(err, StoreError::IntegrityFailed(_)));
    }
}
