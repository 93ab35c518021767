//! Integration tests for revocation and the blacklist.

mod helpers;

use chrono::Duration;
use uuid::Uuid;

use authgate_auth::Usability;
use authgate_core::config::NewDevicePolicy;
use authgate_core::traits::Clock;
use authgate_entity::credential::CredentialStatus;

use helpers::TestEngine;

#[tokio::test]
async fn test_revoke_token_is_idempotent() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let a = t.admit("alice", "A", "a").await;
    let access = &a.credentials[0];

    let first = t.engine.enforcer.revoke_token(access.id).await.unwrap();
    let second = t.engine.enforcer.revoke_token(access.id).await.unwrap();
    assert_eq!(first.affected, 1);
    assert_eq!(second.affected, 0);

    let stored = t.engine.ledger.find(access.id).await.unwrap().unwrap();
    assert_eq!(stored.status, CredentialStatus::Revoked);
    assert!(t.engine.revocation.is_blacklisted("a-access").await.unwrap());
    assert!(t.usable("a-refresh").await);

    let unknown = t.engine.enforcer.revoke_token(Uuid::new_v4()).await.unwrap();
    assert_eq!(unknown.affected, 0);
}

#[tokio::test]
async fn test_revoke_device_leaves_other_devices() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    t.admit("alice", "A", "a").await;
    t.admit("alice", "B", "b").await;

    let outcome = t
        .engine
        .enforcer
        .revoke_device_tokens("alice", "A")
        .await
        .unwrap();
    assert_eq!(outcome.affected, 2);
    assert_eq!(t.devices("alice").await, vec!["B"]);
    assert!(!t.usable("a-access").await);
    assert!(t.usable("b-access").await);

    let again = t
        .engine
        .enforcer
        .revoke_device_tokens("alice", "A")
        .await
        .unwrap();
    assert_eq!(again.affected, 0);
}

#[tokio::test]
async fn test_revoke_all_covers_unrecorded_credentials() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let issued_at = t.clock.now();
    t.admit("alice", "A", "a").await;
    t.admit("alice", "B", "b").await;
    t.advance(Duration::seconds(1));

    let outcome = t.engine.enforcer.revoke_all_user_tokens("alice").await.unwrap();
    assert_eq!(outcome.affected, 4);
    assert!(t.devices("alice").await.is_empty());

    // A credential the ledger never saw, minted before the cutoff.
    let stray = t
        .engine
        .validator
        .check_presented("stray", "alice", issued_at, issued_at + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(stray, Usability::PrincipalRevoked);

    // Logging in again afterwards works normally.
    t.advance(Duration::seconds(1));
    t.admit("alice", "A", "a2").await;
    assert!(t.usable("a2-access").await);
}

#[tokio::test]
async fn test_principal_cutoff_never_moves_back() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let early = t.clock.now();
    t.advance(Duration::minutes(10));

    t.engine.enforcer.revoke_all_user_tokens("alice").await.unwrap();
    let cutoff = t.clock.now();

    t.engine
        .revocation
        .blacklist_principal("alice", early)
        .await
        .unwrap();
    assert_eq!(
        t.engine
            .revocation
            .is_principal_blacklisted("alice")
            .await
            .unwrap(),
        Some(cutoff)
    );

    t.advance(Duration::minutes(1));
    t.engine.enforcer.revoke_all_user_tokens("alice").await.unwrap();
    assert_eq!(
        t.engine
            .revocation
            .is_principal_blacklisted("alice")
            .await
            .unwrap(),
        Some(t.clock.now())
    );
}

#[tokio::test]
async fn test_marker_lapses_with_credential() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let expires_at = t.clock.now() + Duration::minutes(15);

    t.engine
        .revocation
        .blacklist("short-lived", expires_at)
        .await
        .unwrap();
    assert!(t.engine.revocation.is_blacklisted("short-lived").await.unwrap());

    t.advance(Duration::minutes(15));
    assert!(!t.engine.revocation.is_blacklisted("short-lived").await.unwrap());
}
