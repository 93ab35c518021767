//! Integration tests for failed-login lockout through the login flow.

mod helpers;

use chrono::Duration;

use authgate_auth::{LoginOutcome, NewLogin};
use authgate_core::config::NewDevicePolicy;
use authgate_core::traits::Clock;
use authgate_entity::credential::{CredentialKind, DeviceInfo};

use helpers::TestEngine;

fn attempt(n: u32) -> NewLogin {
    NewLogin::new("bob", DeviceInfo::with_id("laptop"))
        .with_credential(CredentialKind::Access, format!("bob-{n}"))
}

#[tokio::test]
async fn test_fifth_failure_locks_for_fifteen_minutes() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let login = &t.engine.coordinator;

    for n in 1..=4 {
        let outcome = login.attempt("bob", false, attempt(n)).await.unwrap();
        assert_eq!(
            outcome,
            LoginOutcome::InvalidCredentials {
                failed_count: n,
                is_locked_out: false,
                lockout_until: None,
            }
        );
    }

    let locked_at = t.clock.now();
    let fifth = login.attempt("bob", false, attempt(5)).await.unwrap();
    let until = locked_at + Duration::minutes(15);
    assert_eq!(
        fifth,
        LoginOutcome::InvalidCredentials {
            failed_count: 5,
            is_locked_out: true,
            lockout_until: Some(until),
        }
    );

    // Locked attempts are refused without being counted.
    t.advance(Duration::minutes(14) + Duration::seconds(59));
    let outcome = login.attempt("bob", true, attempt(6)).await.unwrap();
    assert_eq!(
        outcome,
        LoginOutcome::LockedOut {
            lockout_until: Some(until)
        }
    );
    let status = t.engine.lockout.is_locked_out("bob").await.unwrap();
    assert!(status.is_locked_out);
    assert_eq!(status.failed_count, 5);

    t.advance(Duration::seconds(1));
    assert!(!t.engine.lockout.is_locked_out("bob").await.unwrap().is_locked_out);
    let outcome = login.attempt("bob", true, attempt(7)).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Admitted(_)));
    let status = t.engine.lockout.is_locked_out("bob").await.unwrap();
    assert_eq!(status.failed_count, 0);
}

#[tokio::test]
async fn test_success_resets_the_count() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let login = &t.engine.coordinator;

    for n in 1..=4 {
        login.attempt("bob", false, attempt(n)).await.unwrap();
    }
    login.attempt("bob", true, attempt(5)).await.unwrap();

    let outcome = login.attempt("bob", false, attempt(6)).await.unwrap();
    assert!(matches!(
        outcome,
        LoginOutcome::InvalidCredentials {
            failed_count: 1,
            is_locked_out: false,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failures_after_lockout_expiry_start_over() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let login = &t.engine.coordinator;

    for n in 1..=5 {
        login.attempt("bob", false, attempt(n)).await.unwrap();
    }
    t.advance(Duration::minutes(15));

    let outcome = login.attempt("bob", false, attempt(6)).await.unwrap();
    assert!(matches!(
        outcome,
        LoginOutcome::InvalidCredentials {
            failed_count: 1,
            is_locked_out: false,
            ..
        }
    ));
}

#[tokio::test]
async fn test_admin_unlock() {
    let t = TestEngine::with_policy(true, 0, NewDevicePolicy::Allow);
    let login = &t.engine.coordinator;

    for n in 1..=5 {
        login.attempt("bob", false, attempt(n)).await.unwrap();
    }
    let locked = t.engine.lockout.locked_principals().await.unwrap();
    assert_eq!(locked.len(), 1);
    assert_eq!(locked[0].username, "bob");

    assert!(t.engine.lockout.unlock_user("bob").await.unwrap());
    assert!(!t.engine.lockout.unlock_user("bob").await.unwrap());
    assert!(t.engine.lockout.locked_principals().await.unwrap().is_empty());

    let outcome = login.attempt("bob", true, attempt(6)).await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Admitted(_)));
}
