use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::compute_hash;
use crate::{ContentHasher, CoreError, Hash};

/// Ledger record - a single committed entry, globally addressable by its
/// own content hash and linked to its predecessor on the same chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Digest of the canonical serialization of all other fields
    pub hash: Hash,

    /// Chain this record extends; chains come into existence on first append
    pub chain_id: String,

    /// Position within the chain, starting at 0
    pub index: u64,

    /// Hash of the record at `index - 1`; `None` only at index 0
    pub prev_hash: Option<Hash>,

    /// Engine-assigned timestamp, unix milliseconds; non-decreasing per chain
    pub created_at: u64,

    /// Name of the module owning the body
    pub module: String,

    /// Module-defined content
    pub body: Value,

    /// Caller-supplied metadata, stored verbatim and covered by the hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Record {
    /// Validate structural invariants
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.chain_id.is_empty() {
            return Err(RecordError::InvalidChainId(
                "chain id cannot be empty".to_string(),
            ));
        }

        if self.module.is_empty() {
            return Err(RecordError::InvalidModule(
                "module name cannot be empty".to_string(),
            ));
        }

        if (self.index == 0) != self.prev_hash.is_none() {
            return Err(RecordError::InvalidLink(format!(
                "prev_hash must be absent exactly at index 0, got index {} with prev_hash {:?}",
                self.index, self.prev_hash
            )));
        }

        Ok(())
    }

    /// Get a reference to a field in the body
    pub fn body_field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The draft this record was sealed from (everything but the hash)
    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            chain_id: self.chain_id.clone(),
            index: self.index,
            prev_hash: self.prev_hash,
            created_at: self.created_at,
            module: self.module.clone(),
            body: self.body.clone(),
            context: self.context.clone(),
        }
    }
}

/// All fields of a record except its own hash.
///
/// Drafts are produced inside the chain serializer, where `index`,
/// `prev_hash` and `created_at` are assigned, then sealed into records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordDraft {
    pub chain_id: String,
    pub index: u64,
    pub prev_hash: Option<Hash>,
    pub created_at: u64,
    pub module: String,
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl RecordDraft {
    /// Validate structural invariants (same rules as [`Record::validate`])
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.chain_id.is_empty() {
            return Err(RecordError::InvalidChainId(
                "chain id cannot be empty".to_string(),
            ));
        }

        if self.module.is_empty() {
            return Err(RecordError::InvalidModule(
                "module name cannot be empty".to_string(),
            ));
        }

        if (self.index == 0) != self.prev_hash.is_none() {
            return Err(RecordError::InvalidLink(format!(
                "prev_hash must be absent exactly at index 0, got index {} with prev_hash {:?}",
                self.index, self.prev_hash
            )));
        }

        Ok(())
    }

    /// Seal the draft into a committed record by hashing its canonical form
    pub fn seal(self, hasher: &dyn ContentHasher) -> Result<Record, CoreError> {
        self.validate()?;
        let hash = compute_hash(&self, hasher)?;

        Ok(Record {
            hash,
            chain_id: self.chain_id,
            index: self.index,
            prev_hash: self.prev_hash,
            created_at: self.created_at,
            module: self.module,
            body: self.body,
            context: self.context,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid chain id: {0}")]
    InvalidChainId(String),

    #[error("Invalid module: {0}")]
    InvalidModule(String),

    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("Invalid chain link: {0}")]
    InvalidLink(String),
}
