//! End-to-end propagation behavior against in-memory and SQLite stores.

use coffer::crypto::{ChaChaCipher, GroupKeys};
use coffer::store::{MemoryStore, ShareStore, SqliteStore};
use coffer::{
    FailureReason, FanOut, ServiceError, Session, ShareService, ShareServiceConfig,
};
use coffer_testkit::{FaultyCipher, FaultyStore, PropagationScenario, SharingFixture};
use proptest::prelude::*;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn configs() -> [ShareServiceConfig; 2] {
    [ShareServiceConfig::default(), ShareServiceConfig::concurrent(4)]
}

async fn faulty_service(
    fixture: &SharingFixture,
    config: ShareServiceConfig,
) -> (
    ShareService<FaultyStore<MemoryStore>, ChaChaCipher>,
    Vec<coffer::Share>,
) {
    let store = FaultyStore::new(MemoryStore::new());
    let shares = fixture.seed(&store).await.unwrap();
    (ShareService::new(store, ChaChaCipher::new(), config), shares)
}

#[tokio::test]
async fn test_no_active_shares_is_success() {
    init_tracing();
    for config in configs() {
        let fixture = SharingFixture::new(0);
        let (service, _) = faulty_service(&fixture, config).await;
        let session = Session::authenticated(fixture.owner);

        let result = service
            .propagate_update(&session, &fixture.entry_id, "t", "c", &json!({}), &GroupKeys::new())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.updated_count, 0);
        assert!(result.failed_shares.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(service.store().update_calls(), 0);
    }
}

#[tokio::test]
async fn test_every_share_gets_prior_version_plus_one() {
    init_tracing();
    for config in configs() {
        let fixture = SharingFixture::new(3);
        let (service, shares) = faulty_service(&fixture, config).await;
        let session = Session::authenticated(fixture.owner);
        let data = json!({ "pin": "0000" });

        let result = service
            .propagate_update(&session, &fixture.entry_id, "Alarm", "home", &data, &fixture.keys())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.updated_count, 3);

        for (idx, prior) in shares.iter().enumerate() {
            let share = service.store().get_share(&prior.id).await.unwrap().unwrap();
            assert_eq!(share.version, prior.version + 1);
            assert_eq!(share.title, "Alarm");
            assert_eq!(share.category, "home");
            assert_eq!(share.updated_by, Some(fixture.owner));
            assert!(share.updated_at >= prior.updated_at);
            assert_ne!(share.sealed, prior.sealed);
            assert_eq!(service.open_share(&share.id, fixture.key(idx)).await.unwrap(), data);
        }
    }
}

#[tokio::test]
async fn test_missing_key_does_not_short_circuit() {
    init_tracing();
    for config in configs() {
        let fixture = SharingFixture::new(3);
        let (service, shares) = faulty_service(&fixture, config).await;
        let session = Session::authenticated(fixture.owner);
        let keys = fixture.keys_except(&[fixture.group(0)]);

        let result = service
            .propagate_update(&session, &fixture.entry_id, "New", "c", &json!({ "v": 2 }), &keys)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.updated_count, 2);
        assert_eq!(result.failed_shares, vec![shares[0].id]);
        assert_eq!(result.failures[0].reason, FailureReason::MissingGroupKey);
        assert!(result.errors[0].contains("missing group key"));

        let untouched = service.store().get_share(&shares[0].id).await.unwrap().unwrap();
        assert_eq!(untouched, shares[0]);
        for prior in &shares[1..] {
            let share = service.store().get_share(&prior.id).await.unwrap().unwrap();
            assert_eq!(share.version, 2);
        }
    }
}

#[tokio::test]
async fn test_persistence_failures_are_independent() {
    init_tracing();
    for config in configs() {
        let fixture = SharingFixture::new(2);
        let (service, shares) = faulty_service(&fixture, config).await;
        let session = Session::authenticated(fixture.owner);
        let (s, t) = (&shares[0], &shares[1]);
        service.store().fail_updates_for(s.id);

        let result = service
            .propagate_update(&session, &fixture.entry_id, "New", "c", &json!({}), &fixture.keys())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.updated_count, 1);
        assert_eq!(result.failed_shares, vec![s.id]);
        assert!(matches!(result.failures[0].reason, FailureReason::Persistence(_)));

        let store = service.store().inner();
        assert_eq!(store.get_share(&s.id).await.unwrap().unwrap().version, 1);
        assert_eq!(store.get_share(&t.id).await.unwrap().unwrap().version, 2);

        // Attempted once each, no retries.
        assert_eq!(service.store().update_calls(), 2);
    }
}

#[tokio::test]
async fn test_encryption_failure_is_recorded() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let store = MemoryStore::new();
    let shares = fixture.seed(&store).await.unwrap();

    let cipher = FaultyCipher::new(ChaChaCipher::new());
    cipher.fail_for(fixture.key(1));
    let service = ShareService::new(store, cipher, ShareServiceConfig::default());
    let session = Session::authenticated(fixture.owner);

    let result = service
        .propagate_update(&session, &fixture.entry_id, "New", "c", &json!({}), &fixture.keys())
        .await
        .unwrap();

    assert_eq!(result.updated_count, 1);
    assert_eq!(result.failed_shares, vec![shares[1].id]);
    assert!(matches!(result.failures[0].reason, FailureReason::Encryption(_)));
    assert_eq!(
        service.store().get_share(&shares[1].id).await.unwrap().unwrap().version,
        1
    );
}

#[tokio::test]
async fn test_read_helpers_fail_closed() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let (service, _) = faulty_service(&fixture, ShareServiceConfig::default()).await;

    assert!(service.has_active_shares(&fixture.entry_id).await);
    assert_eq!(service.get_share_count(&fixture.entry_id).await, 2);

    service.store().set_fail_queries(true);
    assert!(!service.has_active_shares(&fixture.entry_id).await);
    assert_eq!(service.get_share_count(&fixture.entry_id).await, 0);
}

#[tokio::test]
async fn test_repeated_propagation_increments_each_time() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let (service, shares) = faulty_service(&fixture, ShareServiceConfig::default()).await;
    let session = Session::authenticated(fixture.owner);
    let data = json!({ "same": "payload" });

    for _ in 0..2 {
        let result = service
            .propagate_update(&session, &fixture.entry_id, "Same", "c", &data, &fixture.keys())
            .await
            .unwrap();
        assert!(result.success);
    }

    for prior in &shares {
        let share = service.store().get_share(&prior.id).await.unwrap().unwrap();
        assert_eq!(share.version, prior.version + 2);
    }
}

#[tokio::test]
async fn test_end_to_end_one_key_missing() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let (service, shares) = faulty_service(&fixture, ShareServiceConfig::default()).await;
    let session = Session::authenticated(fixture.owner);
    let (share_g1, share_g2) = (&shares[0], &shares[1]);

    let keys: GroupKeys = [(fixture.group(0), fixture.key(0).clone())]
        .into_iter()
        .collect();
    let result = service
        .propagate_update(&session, &fixture.entry_id, "New Title", "cat", &json!({ "a": 1 }), &keys)
        .await
        .unwrap();

    assert_eq!(result.updated_count, 1);
    assert_eq!(result.failed_shares, vec![share_g2.id]);
    assert!(!result.success);
    assert_eq!(result.summary(), "1 of 2 shares failed to update");

    let updated = service.store().get_share(&share_g1.id).await.unwrap().unwrap();
    assert_eq!(updated.title, "New Title");
    assert_eq!(updated.category, "cat");
    assert_eq!(updated.version, share_g1.version + 1);
    assert_eq!(
        service.open_share(&share_g1.id, fixture.key(0)).await.unwrap(),
        json!({ "a": 1 })
    );
}

#[tokio::test]
async fn test_unauthenticated_touches_nothing() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let (service, shares) = faulty_service(&fixture, ShareServiceConfig::default()).await;

    let err = service
        .propagate_update(
            &Session::anonymous(),
            &fixture.entry_id,
            "New",
            "c",
            &json!({}),
            &fixture.keys(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotAuthenticated));
    assert_eq!(service.store().update_calls(), 0);
    for prior in &shares {
        let share = service.store().get_share(&prior.id).await.unwrap().unwrap();
        assert_eq!(&share, prior);
    }
}

#[tokio::test]
async fn test_fetch_failure_aborts() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let (service, _) = faulty_service(&fixture, ShareServiceConfig::default()).await;
    let session = Session::authenticated(fixture.owner);
    service.store().set_fail_queries(true);

    let err = service
        .propagate_update(&session, &fixture.entry_id, "New", "c", &json!({}), &fixture.keys())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Store(_)));
    assert_eq!(service.store().update_calls(), 0);
}

#[tokio::test]
async fn test_retry_updates_only_failed_subset() {
    init_tracing();
    let fixture = SharingFixture::new(3);
    let (service, shares) = faulty_service(&fixture, ShareServiceConfig::default()).await;
    let session = Session::authenticated(fixture.owner);
    let data = json!({ "rev": 2 });
    service.store().fail_updates_for(shares[1].id);

    let first = service
        .propagate_update(&session, &fixture.entry_id, "Rev 2", "c", &data, &fixture.keys())
        .await
        .unwrap();
    assert_eq!(first.failed_shares, vec![shares[1].id]);

    service.store().heal_updates();
    let retry = service
        .propagate_update_to(
            &session,
            &fixture.entry_id,
            &first.failed_shares,
            "Rev 2",
            "c",
            &data,
            &fixture.keys(),
        )
        .await
        .unwrap();

    assert!(retry.success);
    assert_eq!(retry.updated_count, 1);
    for prior in &shares {
        let share = service.store().get_share(&prior.id).await.unwrap().unwrap();
        assert_eq!(share.version, 2);
        assert_eq!(share.title, "Rev 2");
    }
}

#[tokio::test]
async fn test_unshared_groups_are_skipped() {
    init_tracing();
    let fixture = SharingFixture::new(2);
    let (service, shares) = faulty_service(&fixture, ShareServiceConfig::default()).await;
    let session = Session::authenticated(fixture.owner);

    assert!(service.unshare(&session, &shares[0].id).await.unwrap());
    assert_eq!(service.get_share_count(&fixture.entry_id).await, 1);

    let result = service
        .propagate_update(&session, &fixture.entry_id, "New", "c", &json!({}), &fixture.keys())
        .await
        .unwrap();
    assert_eq!(result.updated_count, 1);

    let inactive = service.store().get_share(&shares[0].id).await.unwrap().unwrap();
    assert!(!inactive.is_active);
    assert_eq!(inactive.version, 1);
}

#[tokio::test]
async fn test_concurrent_failures_reported_in_fetch_order() {
    init_tracing();
    let fixture = SharingFixture::new(6);
    let config = ShareServiceConfig {
        fan_out: FanOut::Concurrent { max_in_flight: 2 },
    };
    let (service, shares) = faulty_service(&fixture, config).await;
    let session = Session::authenticated(fixture.owner);

    service.store().fail_updates_for(shares[4].id);
    let keys = fixture.keys_except(&[fixture.group(1), fixture.group(5)]);

    let result = service
        .propagate_update(&session, &fixture.entry_id, "New", "c", &json!({}), &keys)
        .await
        .unwrap();

    assert_eq!(result.updated_count, 3);
    assert_eq!(
        result.failed_shares,
        vec![shares[1].id, shares[4].id, shares[5].id]
    );
}

#[tokio::test]
async fn test_sqlite_backend_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coffer.db");
    let fixture = SharingFixture::new(2);
    let session = Session::authenticated(fixture.owner);

    let shares = {
        let store = SqliteStore::open(&path).unwrap();
        let shares = fixture.seed(&store).await.unwrap();
        let service = ShareService::new(store, ChaChaCipher::new(), ShareServiceConfig::concurrent(2));

        let result = service
            .propagate_update(&session, &fixture.entry_id, "Disk", "c", &json!({ "x": 1 }), &fixture.keys())
            .await
            .unwrap();
        assert!(result.success);
        shares
    };

    let service = ShareService::new(
        SqliteStore::open(&path).unwrap(),
        ChaChaCipher::new(),
        ShareServiceConfig::default(),
    );
    assert_eq!(service.get_share_count(&fixture.entry_id).await, 2);
    for (idx, prior) in shares.iter().enumerate() {
        let share = service.store().get_share(&prior.id).await.unwrap().unwrap();
        assert_eq!(share.version, 2);
        assert_eq!(share.title, "Disk");
        assert_eq!(
            service.open_share(&prior.id, fixture.key(idx)).await.unwrap(),
            json!({ "x": 1 })
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_outcomes_follow_share_fates(scenario: PropagationScenario, concurrent: bool) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let fixture = SharingFixture::new(scenario.fates.len());
            let config = if concurrent {
                ShareServiceConfig::concurrent(3)
            } else {
                ShareServiceConfig::default()
            };
            let (service, shares) = faulty_service(&fixture, config).await;
            let session = Session::authenticated(fixture.owner);

            let mut missing = Vec::new();
            let mut expected_failed = Vec::new();
            for (idx, fate) in scenario.fates.iter().enumerate() {
                if !fate.has_key {
                    missing.push(fixture.group(idx));
                }
                if fate.update_fails {
                    service.store().fail_updates_for(shares[idx].id);
                }
                if !fate.succeeds() {
                    expected_failed.push(shares[idx].id);
                }
            }

            let result = service
                .propagate_update(
                    &session,
                    &fixture.entry_id,
                    &scenario.title,
                    &scenario.category,
                    &scenario.data,
                    &fixture.keys_except(&missing),
                )
                .await
                .unwrap();

            assert_eq!(result.updated_count, scenario.expected_updates());
            assert_eq!(result.failed_shares, expected_failed);
            assert_eq!(result.errors.len(), scenario.expected_failures());
            assert_eq!(result.success, scenario.expected_failures() == 0);

            for (idx, fate) in scenario.fates.iter().enumerate() {
                let share = service.store().get_share(&shares[idx].id).await.unwrap().unwrap();
                if fate.succeeds() {
                    assert_eq!(share.version, 2);
                    assert_eq!(&share.title, &scenario.title);
                    assert_eq!(
                        service.open_share(&share.id, fixture.key(idx)).await.unwrap(),
                        scenario.data
                    );
                } else {
                    assert_eq!(share, shares[idx]);
                }
            }
        });
    }
}
