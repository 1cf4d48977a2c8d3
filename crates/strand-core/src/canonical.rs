use serde_json::{Map, Value};

use crate::{ContentHasher, CoreError, Hash, RecordDraft};

/// Serialize a draft to its canonical byte form.
///
/// The canonical form is the hash input and part of the on-disk
/// compatibility contract:
/// - a single JSON object with the keys `body`, `chain_id`, `context`
///   (omitted entirely when absent), `created_at`, `index`, `module` and
///   `prev_hash` (JSON null at genesis)
/// - keys sorted lexicographically at every nesting level
/// - no insignificant whitespace
/// - integer timestamps and indices, hashes as lowercase hex strings
///
/// Every binding of the engine must produce byte-identical output for
/// equal logical records; changing any rule here breaks verification of
/// already-committed chains.
pub fn canonical_bytes(draft: &RecordDraft) -> Result<Vec<u8>, serde_json::Error> {
    let mut canonical = Map::new();

    canonical.insert("body".to_string(), draft.body.clone());
    canonical.insert(
        "chain_id".to_string(),
        Value::String(draft.chain_id.clone()),
    );
    if let Some(ref context) = draft.context {
        canonical.insert("context".to_string(), context.clone());
    }
    canonical.insert(
        "created_at".to_string(),
        Value::Number(draft.created_at.into()),
    );
    canonical.insert("index".to_string(), Value::Number(draft.index.into()));
    canonical.insert("module".to_string(), Value::String(draft.module.clone()));
    canonical.insert(
        "prev_hash".to_string(),
        match draft.prev_hash {
            Some(hash) => Value::String(hash.to_hex()),
            None => Value::Null,
        },
    );

    // serde_json maps are sorted by key, so nested objects inside body and
    // context come out canonical as well
    serde_json::to_vec(&canonical)
}

/// Compute the content hash of a draft via the injected hasher
pub fn compute_hash(draft: &RecordDraft, hasher: &dyn ContentHasher) -> Result<Hash, CoreError> {
    let canonical = canonical_bytes(draft)?;
    Ok(hasher.digest(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sha256Hasher;

    fn draft() -> RecordDraft {
        RecordDraft {
            chain_id: "oid:acme:dGVzdA".to_string(),
            index: 0,
            prev_hash: None,
            created_at: 1_700_000_000_000,
            module: "oid".to_string(),
            body: serde_json::json!({"name": "alice", "namespace": "acme"}),
            context: None,
        }
    }

    #[test]
    fn test_canonical_bytes_deterministic() {
        let a = canonical_bytes(&draft()).unwrap();
        let b = canonical_bytes(&draft()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_canonical_bytes_sorted_and_compact() {
        let bytes = canonical_bytes(&draft()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        // Top-level keys in lexicographic order, no whitespace
        let body_pos = text.find("\"body\"").unwrap();
        let chain_pos = text.find("\"chain_id\"").unwrap();
        let created_pos = text.find("\"created_at\"").unwrap();
        let prev_pos = text.find("\"prev_hash\"").unwrap();
        assert!(body_pos < chain_pos && chain_pos < created_pos && created_pos < prev_pos);
        assert!(!text.contains(' '));
        assert!(text.contains("\"prev_hash\":null"));
    }

    #[test]
    fn test_nested_body_keys_sorted() {
        let mut d = draft();
        d.body = serde_json::from_str(r#"{"zeta": 1, "alpha": {"y": 2, "x": 1}}"#).unwrap();

        let text = String::from_utf8(canonical_bytes(&d).unwrap()).unwrap();
        assert!(text.find("\"alpha\"").unwrap() < text.find("\"zeta\"").unwrap());
        assert!(text.find("\"x\"").unwrap() < text.find("\"y\"").unwrap());
    }

    #[test]
    fn test_context_affects_hash() {
        let without = compute_hash(&draft(), &Sha256Hasher).unwrap();

        let mut with_ctx = draft();
        with_ctx.context = Some(serde_json::json!({"requester": "oid:acme:Ym9i"}));
        let with = compute_hash(&with_ctx, &Sha256Hasher).unwrap();

        assert_ne!(without, with);
    }

    #[test]
    fn test_hash_differs_across_chains() {
        let a = compute_hash(&draft(), &Sha256Hasher).unwrap();

        let mut other = draft();
        other.chain_id = "oid:acme:b3RoZXI".to_string();
        let b = compute_hash(&other, &Sha256Hasher).unwrap();

        assert_ne!(a, b);
    }
}
