//! End-to-end tests for the custody service and router.
//!
//! These cover the guarantees callers rely on:
//! - a rejected signature never leaves a ledger row behind
//! - a storage failure is reported as such, not as a bad signature
//! - the latest enrollment under a name is the one that counts

use std::sync::Arc;

use async_trait::async_trait;
use custody::store::{IdentityStore, LedgerStore, MemoryStore, Result as StoreResult, StoreError};
use custody::{
    CreateRequest, CustodyConfig, CustodyError, CustodyService, ErrorKind, Identity, IdentityId,
    LedgerEntry, ListRequest, RecordRequest, Reply, Request, Response, Router,
};
use custody_testkit::generators::{name, payload};
use custody_testkit::{users, TestFixture, TestUser};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn scenario_create_record_list() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::sqlite();
    let evan = TestUser::new("evan");
    let mallory = TestUser::new("evan");

    let identity = fixture.enroll_user(&evan).await;
    assert_eq!(identity.id, IdentityId(1));

    let entry = fixture.service.record("evan", b"hello", &evan.sign("hello")).await?;
    assert_eq!(entry.identity, IdentityId(1));
    assert_eq!(entry.message, b"hello");
    assert_eq!(fixture.service.list("evan").await?, vec![entry.clone()]);

    let err = fixture
        .service
        .record("evan", b"hello", &mallory.sign("hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    assert_eq!(fixture.service.list("evan").await?, vec![entry]);

    Ok(())
}

#[tokio::test]
async fn most_recent_enrollment_is_authoritative() -> anyhow::Result<()> {
    let fixture = TestFixture::sqlite();
    let parties = users(&["evan", "evan"]);

    let first = fixture.enroll_user(&parties[0]).await;
    let second = fixture.enroll_user(&parties[1]).await;

    let entry = fixture
        .service
        .record("evan", b"second key", &parties[1].sign("second key"))
        .await?;
    assert_eq!(entry.identity, second.id);

    // The superseded key no longer records, and its identity's ledger stays empty
    let err = fixture
        .service
        .record("evan", b"first key", &parties[0].sign("first key"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    assert_eq!(fixture.ledger_len(first.id).await, 0);
    assert_eq!(fixture.ledger_len(second.id).await, 1);

    let all = fixture.service.identities("evan").await?;
    assert_eq!(
        all.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    Ok(())
}

#[tokio::test]
async fn garbage_key_is_accepted_then_fails_on_record() -> anyhow::Result<()> {
    let fixture = TestFixture::sqlite();
    let identity = fixture.service.create("evan", b"BEGIN ECSDA KEY").await?;

    let err = fixture
        .service
        .record("evan", b"hello", &TestUser::new("evan").sign("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, CustodyError::KeyFormat(_)));
    assert_eq!(fixture.ledger_len(identity.id).await, 0);

    Ok(())
}

#[tokio::test]
async fn wrong_algorithm_key_is_key_format_error() -> anyhow::Result<()> {
    // An Ed25519 SubjectPublicKeyInfo: valid DER, wrong algorithm.
    let mut der = hex::decode("302a300506032b6570032100")?;
    der.extend_from_slice(&[0x11; 32]);

    let fixture = TestFixture::new();
    fixture.service.create("evan", &der).await?;

    let err = fixture.service.record("evan", b"hi", &[0; 64]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyFormat);

    Ok(())
}

#[tokio::test]
async fn p384_identity_records_sha256_signatures() -> anyhow::Result<()> {
    use p384::ecdsa::signature::hazmat::PrehashSigner;
    use p384::pkcs8::EncodePublicKey;
    use sha2::{Digest, Sha256};

    let signing = p384::ecdsa::SigningKey::random(&mut rand::rngs::OsRng);
    let der = signing.verifying_key().to_public_key_der().unwrap();

    let fixture = TestFixture::sqlite();
    let identity = fixture.service.create("evan", der.as_bytes()).await?;

    let sig: p384::ecdsa::Signature = signing
        .sign_prehash(&Sha256::digest(b"sealed bag 17"))
        .unwrap();
    let entry = fixture
        .service
        .record("evan", b"sealed bag 17", &sig.to_bytes())
        .await?;
    assert_eq!(entry.identity, identity.id);

    let err = fixture
        .service
        .record("evan", b"sealed bag 18", &sig.to_bytes())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    assert_eq!(fixture.ledger_len(identity.id).await, 1);

    Ok(())
}

#[tokio::test]
async fn binary_evidence_roundtrips_through_sqlite() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("custody.sqlite");
    let evan = TestUser::new("evan");
    // PNG signature followed by bytes that are not valid UTF-8
    let evidence = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0xff, 0x00, 0xfe];

    {
        let config = CustodyConfig::from_toml_str(&format!(
            "[database]\npath = {:?}\n",
            path.display().to_string()
        ))?;
        let router = Router::new(CustodyService::new(config.open_store()?, config));
        router
            .dispatch(Request::Create(CreateRequest {
                name: "evan".to_string(),
                public_key: evan.public_key_der(),
            }))
            .await?;

        let request: Request = serde_json::from_value(serde_json::json!({
            "command": "validate",
            "name": "evan",
            "data": hex::encode(&evidence),
            "hash": hex::encode(evan.sign(&evidence)),
        }))?;
        let Reply::Entry(entry) = router.dispatch(request).await? else {
            panic!("expected entry reply");
        };
        assert_eq!(entry.message, evidence);
    }

    // Read back after reopening the file
    let store = custody::store::SqliteStore::open(&path)?;
    let service = CustodyService::new(store, CustodyConfig::default());
    let entries = service.list("evan").await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, evidence);
    assert!(service.check("evan", &entries[0].message, &entries[0].hash).await?);

    Ok(())
}

/// A store whose ledger writes always fail.
struct ReadOnlyLedger(MemoryStore);

#[async_trait]
impl IdentityStore for ReadOnlyLedger {
    async fn create_identity(&self, name: &str, public_key: &[u8]) -> StoreResult<Identity> {
        self.0.create_identity(name, public_key).await
    }

    async fn find_by_id(&self, id: IdentityId) -> StoreResult<Identity> {
        self.0.find_by_id(id).await
    }

    async fn find_all_by_name(&self, name: &str) -> StoreResult<Vec<Identity>> {
        self.0.find_all_by_name(name).await
    }

    async fn update_key(&self, id: IdentityId, public_key: &[u8]) -> StoreResult<()> {
        self.0.update_key(id, public_key).await
    }
}

#[async_trait]
impl LedgerStore for ReadOnlyLedger {
    async fn append(&self, _: IdentityId, _: &[u8], _: &[u8]) -> StoreResult<LedgerEntry> {
        Err(StoreError::Task("disk full".to_string()))
    }

    async fn find_by_identity(&self, identity: IdentityId) -> StoreResult<Vec<LedgerEntry>> {
        self.0.find_by_identity(identity).await
    }

    async fn count_by_identity(&self, identity: IdentityId) -> StoreResult<u64> {
        self.0.count_by_identity(identity).await
    }
}

#[tokio::test]
async fn storage_failure_is_not_a_signature_failure() -> anyhow::Result<()> {
    let fixture = TestFixture::with_store(ReadOnlyLedger(MemoryStore::new()));
    let (evan, _) = fixture.enroll("evan").await;

    let err = fixture
        .service
        .record("evan", b"hello", &evan.sign("hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    let err = fixture
        .service
        .record("evan", b"hello", &evan.forge("hello"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_records_all_land() -> anyhow::Result<()> {
    let fixture = TestFixture::sqlite();
    let (evan, identity) = fixture.enroll("evan").await;

    let mut tasks = Vec::new();
    for i in 0..16 {
        let service = fixture.service.clone();
        let message = format!("event {i}");
        let signature = if i % 4 == 0 {
            evan.forge(&message)
        } else {
            evan.sign(&message)
        };
        tasks.push(tokio::spawn(async move {
            service.record("evan", message.as_bytes(), &signature).await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await? {
            Ok(_) => accepted += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::InvalidSignature),
        }
    }

    assert_eq!(accepted, 12);
    assert_eq!(fixture.ledger_len(identity.id).await, 12);

    Ok(())
}

#[tokio::test]
async fn router_over_sqlite_file() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let config = CustodyConfig::from_toml_str(&format!(
        "[database]\npath = {:?}\n",
        dir.path().join("custody.sqlite").display().to_string()
    ))?;
    let store = Arc::new(config.open_store()?);
    let router = Router::new(CustodyService::with_shared(Arc::clone(&store), config));
    let evan = TestUser::new("evan");

    // Requests arrive as JSON from the transport
    let create: Request = serde_json::from_value(serde_json::json!({
        "command": "create",
        "name": "evan",
        "public_key": hex::encode(evan.public_key_der()),
    }))?;
    let Response::Ok(Reply::Identity(identity)) = router.handle(create).await else {
        panic!("create failed");
    };

    let response = router
        .handle(Request::Validate(RecordRequest {
            name: "evan".to_string(),
            data: b"custody transfer".to_vec(),
            hash: evan.sign("custody transfer"),
        }))
        .await;
    assert!(response.is_ok());

    let response = router
        .handle(Request::Validate(RecordRequest {
            name: "evan".to_string(),
            data: b"custody transfer".to_vec(),
            hash: evan.forge("custody transfer"),
        }))
        .await;
    let json = serde_json::to_value(&response)?;
    assert_eq!(json["err"]["kind"], "invalid_signature");

    let Response::Ok(Reply::Entries(entries)) = router
        .handle(Request::List(ListRequest {
            name: "evan".to_string(),
        }))
        .await
    else {
        panic!("list failed");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].identity, identity.id);
    assert_eq!(store.count_by_identity(identity.id).await?, 1);

    let response = router
        .handle(Request::Create(CreateRequest {
            name: "evan".to_string(),
            public_key: Vec::new(),
        }))
        .await;
    assert!(matches!(response, Response::Err(e) if e.kind == ErrorKind::Validation));

    Ok(())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn forged_signatures_never_write(name in name(), msg in payload(64), tries in 1usize..4) {
        runtime().block_on(async {
            let fixture = TestFixture::sqlite();
            let (user, identity) = fixture.enroll(&name).await;
            fixture.service.record(&name, &msg, &user.sign(&msg)).await.unwrap();

            for _ in 0..tries {
                let err = fixture
                    .service
                    .record(&name, &msg, &user.forge(&msg))
                    .await
                    .unwrap_err();
                assert_eq!(err.kind(), ErrorKind::InvalidSignature);
            }

            assert_eq!(fixture.ledger_len(identity.id).await, 1);
            assert_eq!(fixture.service.list(&name).await.unwrap().len(), 1);
        });
    }
}
