//! Integration tests for device login admission.

mod helpers;

use chrono::Duration;

use authgate_auth::NewLogin;
use authgate_auth::policy::AdmissionOutcome;
use authgate_core::config::NewDevicePolicy;
use authgate_core::error::ErrorKind;
use authgate_core::traits::Clock;
use authgate_entity::credential::{CredentialKind, DeviceInfo};

use helpers::TestEngine;

#[tokio::test]
async fn test_third_device_evicts_oldest() {
    let t = TestEngine::with_policy(true, 2, NewDevicePolicy::EvictOldest);

    let a = t.admit("alice", "A", "a").await;
    t.advance(Duration::minutes(1));
    t.admit("alice", "B", "b").await;
    t.advance(Duration::minutes(1));
    let c = t.admit("alice", "C", "c").await;

    assert_eq!(t.devices("alice").await, vec!["B", "C"]);
    let evicted_a: Vec<_> = a.credentials.iter().map(|r| r.id).collect();
    assert_eq!(c.evicted.len(), 2);
    assert!(c.evicted.iter().all(|id| evicted_a.contains(id)));

    assert!(!t.usable("a-access").await);
    assert!(!t.usable("a-refresh").await);
    assert!(t
        .engine
        .revocation
        .is_blacklisted("a-access")
        .await
        .unwrap());
    assert!(t.usable("b-access").await);
    assert!(t.usable("c-refresh").await);
}

#[tokio::test]
async fn test_relogin_keeps_original_position() {
    let t = TestEngine::with_policy(true, 2, NewDevicePolicy::EvictOldest);

    t.admit("alice", "A", "a1").await;
    t.advance(Duration::minutes(1));
    t.admit("alice", "B", "b").await;
    t.advance(Duration::minutes(1));

    let again = t.admit("alice", "A", "a2").await;
    assert!(again.refreshed);
    assert!(again.evicted.is_empty());
    assert_eq!(t.devices("alice").await, vec!["A", "B"]);

    // A still logged in first, so it goes before B.
    t.advance(Duration::minutes(1));
    t.admit("alice", "C", "c").await;
    assert_eq!(t.devices("alice").await, vec!["B", "C"]);
    assert!(!t.usable("a1-access").await);
    assert!(!t.usable("a2-access").await);
}

#[tokio::test]
async fn test_deny_rejects_new_device_at_cap() {
    let t = TestEngine::with_policy(true, 2, NewDevicePolicy::Deny);

    t.admit("alice", "A", "a").await;
    t.admit("alice", "B", "b").await;

    let preview = t
        .engine
        .enforcer
        .check_login_policy("alice", Some("C"))
        .await
        .unwrap();
    assert!(!preview.allowed);
    assert!(preview.message.is_some());

    let outcome = t.login("alice", "C", "c").await;
    assert!(matches!(outcome, AdmissionOutcome::Rejected { .. }));
    assert_eq!(t.devices("alice").await, vec!["A", "B"]);
    assert!(t
        .engine
        .ledger
        .find_by_reference_id("c-access")
        .await
        .unwrap()
        .is_none());

    // A known device is a refresh and passes.
    assert!(t.admit("alice", "B", "b2").await.refreshed);

    // Other principals have their own allowance.
    t.admit("carol", "C", "carol").await;
}

#[tokio::test]
async fn test_single_device_evicts_every_other_device() {
    let t = TestEngine::with_policy(false, 0, NewDevicePolicy::EvictOldest);

    t.admit("alice", "A", "a").await;
    t.advance(Duration::seconds(5));
    let b = t.admit("alice", "B", "b").await;
    assert_eq!(b.evicted.len(), 2);
    assert_eq!(t.devices("alice").await, vec!["B"]);
}

#[tokio::test]
async fn test_allow_admits_over_cap() {
    let t = TestEngine::with_policy(true, 1, NewDevicePolicy::Allow);

    t.admit("alice", "A", "a").await;
    let b = t.admit("alice", "B", "b").await;
    assert!(b.evicted.is_empty());
    assert_eq!(t.devices("alice").await.len(), 2);

    let preview = t
        .engine
        .enforcer
        .check_login_policy("alice", Some("C"))
        .await
        .unwrap();
    assert!(preview.allowed);
}

#[tokio::test]
async fn test_sessions_flag_current_and_track_activity() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);

    let a = t.admit("alice", "A", "a").await;
    t.advance(Duration::minutes(3));
    t.engine
        .ledger
        .touch(a.session_id, t.clock.now())
        .await
        .unwrap();

    let sessions = t
        .engine
        .enforcer
        .get_user_sessions("alice", Some(a.session_id))
        .await
        .unwrap();
    assert_eq!(sessions.len(), 2);
    let current = sessions
        .iter()
        .find(|s| s.session_id == a.session_id)
        .unwrap();
    assert!(current.is_current);
    assert_eq!(current.last_active_at, t.clock.now());
    assert!(sessions
        .iter()
        .filter(|s| s.session_id != a.session_id)
        .all(|s| !s.is_current && s.last_active_at == s.login_at));
}

#[tokio::test]
async fn test_deviceless_login_counts_as_one_session() {
    let t = TestEngine::with_policy(true, 2, NewDevicePolicy::Deny);

    let first = t.login_without_device("alice", "web").await;
    let first = first.admitted().cloned().unwrap();
    assert!(first.credentials.iter().all(|r| r.login_id == first.session_id));
    assert_eq!(t.login_count("alice").await, 1);

    t.advance(Duration::seconds(5));
    let phone = t.login("alice", "phone", "phone").await;
    assert!(phone.admitted().is_some());
    assert_eq!(t.login_count("alice").await, 2);

    t.advance(Duration::seconds(5));
    let third = t.login_without_device("alice", "web2").await;
    assert!(matches!(third, AdmissionOutcome::Rejected { .. }));
}

#[tokio::test]
async fn test_deviceless_login_is_evicted_whole() {
    let t = TestEngine::with_policy(true, 2, NewDevicePolicy::EvictOldest);

    let web = t.admit_without_device("alice", "web").await;
    t.advance(Duration::seconds(5));
    let phone = t.admit("alice", "phone", "phone").await;
    assert!(phone.evicted.is_empty());
    assert!(t.usable("web-access").await);
    assert!(t.usable("web-refresh").await);

    t.advance(Duration::seconds(5));
    let tablet = t.admit("alice", "tablet", "tablet").await;
    let mut expected: Vec<_> = web.credentials.iter().map(|r| r.id).collect();
    let mut evicted = tablet.evicted.clone();
    expected.sort();
    evicted.sort();
    assert_eq!(evicted, expected);
    assert!(!t.usable("web-access").await);
    assert!(!t.usable("web-refresh").await);
    assert!(t.usable("phone-access").await);
}

#[tokio::test]
async fn test_failed_admission_leaves_sessions_untouched() {
    let t = TestEngine::with_policy(true, 1, NewDevicePolicy::EvictOldest);

    t.admit("alice", "laptop", "laptop").await;
    t.advance(Duration::seconds(5));

    // The refresh reference id clashes with the laptop's.
    let login = NewLogin::new("alice", DeviceInfo::with_id("phone"))
        .with_credential(CredentialKind::Access, "phone-access")
        .with_credential(CredentialKind::Refresh, "laptop-refresh");
    let err = t.engine.enforcer.admit_login(login).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert!(t.usable("laptop-access").await);
    assert!(t.usable("laptop-refresh").await);
    assert!(!t
        .engine
        .revocation
        .is_blacklisted("laptop-access")
        .await
        .unwrap());
    assert!(t
        .engine
        .ledger
        .find_by_reference_id("phone-access")
        .await
        .unwrap()
        .is_none());
    assert_eq!(t.devices("alice").await, vec!["laptop"]);
}
