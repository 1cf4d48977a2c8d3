use strand_core::ModuleConfig;
use strand_engine::{
    AccessRequest, AclConfig, AppendInput, ChainEngine, EngineError, Grant, LedgerConfig,
    RevokeRequest,
};

fn acl_config() -> LedgerConfig {
    LedgerConfig::with_modules(
        "acl-ledger".to_string(),
        vec![ModuleConfig::new(
            "oid".to_string(),
            "1.0.0".to_string(),
            serde_json::json!({}),
        )],
    )
    .with_acl(AclConfig::InMemory)
}

fn grant(subject: &str, resource: &str, action: &str) -> Grant {
    Grant {
        subject_oid: subject.to_string(),
        resource_oid: resource.to_string(),
        action: action.to_string(),
        granted_by: "oid:acme:YWRtaW4".to_string(),
        granted_at: 1_700_000_000_000,
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

/// Scenario: grant, check true; revoke, check false.
#[tokio::test]
async fn test_grant_check_revoke_cycle() {
    let engine = ChainEngine::new(acl_config()).unwrap();

    engine.grant(grant("alice", "doc1", "read")).await.unwrap();
    assert!(engine
        .check_access(&request("alice", "doc1", "read"))
        .await
        .unwrap());

    engine
        .revoke(&RevokeRequest {
            subject_oid: "alice".to_string(),
            resource_oid: "doc1".to_string(),
            action: "read".to_string(),
        })
        .await
        .unwrap();
    assert!(!engine
        .check_access(&request("alice", "doc1", "read"))
        .await
        .unwrap());
}

/// Idempotence: granting an existing tuple replaces it without growing
/// the grant list; revoking a missing tuple is a no-op.
#[tokio::test]
async fn test_grant_upsert_and_revoke_idempotence() {
    let engine = ChainEngine::new(acl_config()).unwrap();

    engine.grant(grant("alice", "doc1", "read")).await.unwrap();
    let mut replacement = grant("alice", "doc1", "read");
    replacement.granted_at = 1_700_000_000_999;
    engine.grant(replacement).await.unwrap();

    let grants = engine.list_grants("alice").await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].granted_at, 1_700_000_000_999);

    // Revoke of a tuple that never existed
    engine
        .revoke(&RevokeRequest {
            subject_oid: "alice".to_string(),
            resource_oid: "ghost".to_string(),
            action: "read".to_string(),
        })
        .await
        .unwrap();
}

/// Expired grants fail checks and drop out of listings.
#[tokio::test]
async fn test_expired_grant_denied() {
    let engine = ChainEngine::new(acl_config()).unwrap();

    let mut expired = grant("alice", "doc1", "read");
    expired.expires_at = Some(1); // long past
    engine.grant(expired).await.unwrap();

    assert!(!engine
        .check_access(&request("alice", "doc1", "read"))
        .await
        .unwrap());
    assert!(engine.list_grants("alice").await.unwrap().is_empty());
}

/// Appends are gated when the ACL is on: context requester is required,
/// grants open chains, and subjects always own chains rooted at their
/// own OID.
#[tokio::test]
async fn test_append_gating() {
    let engine = ChainEngine::new(acl_config()).unwrap();

    // No requester in context
    let err = engine
        .append(AppendInput::new("oid", "shared:feed", serde_json::json!({"name": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AccessDenied(_)));

    // Requester without a grant
    let err = engine
        .append(
            AppendInput::new("oid", "shared:feed", serde_json::json!({"name": "x"}))
                .with_context(serde_json::json!({"requester": "oid:acme:YWxpY2U"})),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AccessDenied(_)));

    // Grant opens the chain
    engine
        .grant(grant("oid:acme:YWxpY2U", "shared:feed", "append"))
        .await
        .unwrap();
    let record = engine
        .append(
            AppendInput::new("oid", "shared:feed", serde_json::json!({"name": "x"}))
                .with_context(serde_json::json!({"requester": "oid:acme:YWxpY2U"})),
        )
        .await
        .unwrap();
    assert_eq!(record.index, 0);

    // Own chain needs no grant (resource-owner rule)
    let record = engine
        .append(
            AppendInput::new("oid", "oid:acme:YWxpY2U/journal", serde_json::json!({"name": "y"}))
                .with_context(serde_json::json!({"requester": "oid:acme:YWxpY2U"})),
        )
        .await
        .unwrap();
    assert_eq!(record.index, 0);
}

/// Without an ACL configured, grant/revoke are unsupported but checks
/// allow everything.
#[tokio::test]
async fn test_acl_disabled_behavior() {
    let config = LedgerConfig::with_modules(
        "open-ledger".to_string(),
        vec![ModuleConfig::new(
            "oid".to_string(),
            "1.0.0".to_string(),
            serde_json::json!({}),
        )],
    );
    let engine = ChainEngine::new(config).unwrap();

    assert!(engine
        .check_access(&request("anyone", "anything", "append"))
        .await
        .unwrap());
    assert!(engine.list_grants("anyone").await.unwrap().is_empty());
    assert!(matches!(
        engine.grant(grant("a", "r", "x")).await,
        Err(EngineError::Unsupported(_))
    ));

    // Appends are not gated
    engine
        .append(AppendInput::new("oid", "c1", serde_json::json!({"name": "x"})))
        .await
        .unwrap();
}

/// Concurrent grant/revoke on distinct subjects do not interfere.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subjects() {
    let engine = std::sync::Arc::new(ChainEngine::new(acl_config()).unwrap());

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let subject = format!("subject-{i}");
            engine.grant(grant(&subject, "doc", "read")).await.unwrap();
            assert!(engine
                .check_access(&request(&subject, "doc", "read"))
                .await
                .unwrap());
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for i in 0..16 {
        let grants = engine.list_grants(&format!("subject-{i}")).await.unwrap();
        assert_eq!(grants.len(), 1);
    }
}
