//! Per-chain append serialization

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// Map size that triggers a sweep of idle serializers
const SWEEP_THRESHOLD: usize = 1024;

/// Lazily-created exclusive locks, one per chain id.
///
/// A serializer totally orders appends to its chain: the head read, hash
/// computation and store put all happen while it is held. Chains are
/// independent, so appends on distinct ids never contend here.
///
/// Idle entries are swept once the map grows past [`SWEEP_THRESHOLD`].
/// Recreating a swept serializer is safe: the store's `(chain_id, index)`
/// uniqueness constraint is the backstop if two instances ever coexist.
#[derive(Debug, Default)]
pub(crate) struct ChainSerializers {
    chains: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ChainSerializers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Handle for `chain_id`, created on first use
    pub(crate) fn handle(&self, chain_id: &str) -> Arc<AsyncMutex<()>> {
        let mut chains = self
            .chains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if chains.len() > SWEEP_THRESHOLD {
            chains.retain(|_, lock| Arc::strong_count(lock) > 1);
        }

        chains
            .entry(chain_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.chains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
