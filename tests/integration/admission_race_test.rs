//! Integration tests for concurrent login admission.

mod helpers;

use futures::future::join_all;

use authgate_auth::NewLogin;
use authgate_auth::policy::AdmissionOutcome;
use authgate_core::config::NewDevicePolicy;
use authgate_entity::credential::{CredentialKind, DeviceInfo};

use helpers::TestEngine;

/// Fire one login per device concurrently and tally the outcomes.
async fn race(t: &TestEngine, devices: usize) -> (usize, usize) {
    let tasks = (0..devices).map(|i| {
        let enforcer = t.engine.enforcer.clone();
        tokio::spawn(async move {
            let login = NewLogin::new("alice", DeviceInfo::with_id(format!("device-{i}")))
                .with_credential(CredentialKind::Access, format!("race-{i}"));
            enforcer.admit_login(login).await
        })
    });

    let mut admitted = 0;
    let mut rejected = 0;
    for result in join_all(tasks).await {
        match result.expect("task panicked") {
            Ok(AdmissionOutcome::Admitted(_)) => admitted += 1,
            Ok(AdmissionOutcome::Rejected { .. }) => rejected += 1,
            Err(e) => assert!(e.is_retryable(), "unexpected error: {e}"),
        }
    }
    (admitted, rejected)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deny_admits_exactly_the_cap() {
    let t = TestEngine::with_policy(true, 3, NewDevicePolicy::Deny);

    let (admitted, rejected) = race(&t, 10).await;
    assert_eq!(admitted, 3);
    assert_eq!(rejected, 7);
    assert_eq!(t.devices("alice").await.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_evict_oldest_never_exceeds_the_cap() {
    let t = TestEngine::with_policy(true, 2, NewDevicePolicy::EvictOldest);

    let (admitted, rejected) = race(&t, 8).await;
    assert_eq!(rejected, 0);
    assert!(admitted >= 2);
    assert_eq!(t.devices("alice").await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_device_race_leaves_one_session() {
    let t = TestEngine::with_policy(false, 0, NewDevicePolicy::EvictOldest);

    race(&t, 6).await;
    assert_eq!(t.devices("alice").await.len(), 1);
}
