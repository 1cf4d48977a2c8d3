use serde::Serialize;

use crate::canonical::compute_hash;
use crate::{ContentHasher, Hash, Record};

/// Why a chain segment failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFault {
    /// Stored hash does not match the recomputed canonical digest
    HashMismatch,
    /// `prev_hash` does not point at the preceding record (or is non-null
    /// at genesis)
    PrevHashMismatch,
    /// Index does not match the record's position in the segment
    IndexMismatch,
    /// `created_at` went backwards along the chain
    CreatedAtRegression,
}

impl VerifyFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyFault::HashMismatch => "hash_mismatch",
            VerifyFault::PrevHashMismatch => "prev_hash_mismatch",
            VerifyFault::IndexMismatch => "index_mismatch",
            VerifyFault::CreatedAtRegression => "created_at_regression",
        }
    }
}

/// Outcome of verifying a chain segment.
///
/// Verification is observational: nothing is repaired, and checking stops
/// at the first fault.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Whether every checked record passed
    pub valid: bool,

    /// Number of records examined
    pub checked: u64,

    /// Chain index of the first failing record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_invalid_index: Option<u64>,

    /// What went wrong at that index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<VerifyFault>,
}

impl VerificationReport {
    fn ok(checked: u64) -> Self {
        Self {
            valid: true,
            checked,
            first_invalid_index: None,
            fault: None,
        }
    }

    fn fail(checked: u64, index: u64, fault: VerifyFault) -> Self {
        Self {
            valid: false,
            checked,
            first_invalid_index: Some(index),
            fault: Some(fault),
        }
    }
}

/// Verify a contiguous chain segment starting at `start_index`.
///
/// `anchor` is the hash of the record at `start_index - 1` and is required
/// whenever the segment does not begin at genesis; without it the first
/// link cannot be checked.
///
/// Per record, in order: position, predecessor link, recomputed hash,
/// timestamp monotonicity. The link check runs before the hash recompute
/// so that a tampered `prev_hash` is reported as a broken link rather
/// than as a content mismatch.
pub fn verify_segment(
    records: &[Record],
    start_index: u64,
    anchor: Option<Hash>,
    hasher: &dyn ContentHasher,
) -> VerificationReport {
    let mut expected_prev = anchor;
    let mut prev_created_at: Option<u64> = None;

    for (pos, record) in records.iter().enumerate() {
        let checked = pos as u64;
        let expected_index = start_index + pos as u64;

        if record.index != expected_index {
            return VerificationReport::fail(checked, expected_index, VerifyFault::IndexMismatch);
        }

        if record.prev_hash != expected_prev {
            return VerificationReport::fail(
                checked,
                record.index,
                VerifyFault::PrevHashMismatch,
            );
        }

        match compute_hash(&record.to_draft(), hasher) {
            Ok(computed) if computed == record.hash => {}
            _ => {
                return VerificationReport::fail(checked, record.index, VerifyFault::HashMismatch);
            }
        }

        if let Some(prev) = prev_created_at {
            if record.created_at < prev {
                return VerificationReport::fail(
                    checked,
                    record.index,
                    VerifyFault::CreatedAtRegression,
                );
            }
        }

        expected_prev = Some(record.hash);
        prev_created_at = Some(record.created_at);
    }

    VerificationReport::ok(records.len() as u64)
}
