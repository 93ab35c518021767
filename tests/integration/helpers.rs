//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use authgate_auth::policy::{Admission, AdmissionOutcome};
use authgate_auth::{AuthEngine, EngineSettings, NewLogin};
use authgate_core::config::{LoginPolicySettings, NewDevicePolicy, StoreFailureMode};
use authgate_core::result::AppResult;
use authgate_core::traits::ManualClock;
use authgate_entity::credential::{CredentialKind, DeviceInfo};

/// An engine on in-process stores with a hand-driven clock.
pub struct TestEngine {
    /// Every engine component
    pub engine: AuthEngine,
    /// The clock all components read
    pub clock: Arc<ManualClock>,
}

impl TestEngine {
    /// Engine with the given settings
    pub fn new(settings: EngineSettings) -> Self {
        let clock = Arc::new(ManualClock::new(
            DateTime::parse_from_rfc3339("2024-05-01T08:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
        ));
        let engine = AuthEngine::in_memory(settings, clock.clone());
        Self { engine, clock }
    }

    /// Engine with a device policy and defaults elsewhere
    pub fn with_policy(multi: bool, max_devices: u32, policy: NewDevicePolicy) -> Self {
        let mut settings = EngineSettings::new(StoreFailureMode::FailClosed);
        settings.login_policy = LoginPolicySettings {
            allow_multiple_devices: multi,
            max_devices,
            new_device_policy: policy,
            ..LoginPolicySettings::default()
        };
        Self::new(settings)
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Log `subject` in from `device` with an access/refresh pair named after
    /// `tag`
    pub async fn login(&self, subject: &str, device: &str, tag: &str) -> AdmissionOutcome {
        self.try_login(subject, DeviceInfo::with_id(device), tag)
            .await
            .expect("admission should not fail")
    }

    /// Log in from a client that sends no device id
    pub async fn login_without_device(&self, subject: &str, tag: &str) -> AdmissionOutcome {
        self.try_login(subject, DeviceInfo::default(), tag)
            .await
            .expect("admission should not fail")
    }

    /// Attempt a login with an access/refresh pair named after `tag`
    pub async fn try_login(
        &self,
        subject: &str,
        device: DeviceInfo,
        tag: &str,
    ) -> AppResult<AdmissionOutcome> {
        let login = NewLogin::new(subject, device)
            .with_credential(CredentialKind::Access, format!("{tag}-access"))
            .with_credential(CredentialKind::Refresh, format!("{tag}-refresh"));
        self.engine.enforcer.admit_login(login).await
    }

    /// Like [`login`](Self::login) but insists on admission
    pub async fn admit(&self, subject: &str, device: &str, tag: &str) -> Admission {
        match self.login(subject, device, tag).await {
            AdmissionOutcome::Admitted(admission) => admission,
            AdmissionOutcome::Rejected { reason } => panic!("login rejected: {reason}"),
        }
    }

    /// Like [`login_without_device`](Self::login_without_device) but insists
    /// on admission
    pub async fn admit_without_device(&self, subject: &str, tag: &str) -> Admission {
        match self.login_without_device(subject, tag).await {
            AdmissionOutcome::Admitted(admission) => admission,
            AdmissionOutcome::Rejected { reason } => panic!("login rejected: {reason}"),
        }
    }

    /// Device ids holding a session, oldest login first
    pub async fn devices(&self, subject: &str) -> Vec<String> {
        let mut sessions = self
            .engine
            .enforcer
            .get_user_sessions(subject, None)
            .await
            .expect("session listing");
        sessions.sort_by_key(|s| (s.login_at, s.session_id));
        let mut devices: Vec<String> = Vec::new();
        for session in sessions {
            let device = session.device_id.unwrap_or_default();
            if !devices.contains(&device) {
                devices.push(device);
            }
        }
        devices
    }

    /// Number of distinct logins holding a valid credential
    pub async fn login_count(&self, subject: &str) -> usize {
        let mut logins: Vec<_> = self
            .engine
            .enforcer
            .get_user_sessions(subject, None)
            .await
            .expect("session listing")
            .into_iter()
            .map(|s| s.login_id)
            .collect();
        logins.sort();
        logins.dedup();
        logins.len()
    }

    /// Whether the credential named `reference` passes the usability check
    pub async fn usable(&self, reference: &str) -> bool {
        let record = self
            .engine
            .ledger
            .find_by_reference_id(reference)
            .await
            .expect("ledger read")
            .expect("credential recorded");
        self.engine
            .validator
            .validate(&record)
            .await
            .expect("validation")
            .is_usable()
    }
}
