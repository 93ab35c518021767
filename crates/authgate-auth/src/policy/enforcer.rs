//! Login policy enforcer: lease-guarded admission and revocation commands.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use authgate_cache::keys;
use authgate_core::config::LoginPolicySettings;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::traits::Clock;
use authgate_entity::credential::{CredentialKind, CredentialRecord};
use authgate_entity::session::Session;

use super::decision::{Decision, decide};
use super::login::NewLogin;
use super::outcome::{Admission, AdmissionOutcome, PolicyCheck, RevocationOutcome};
use crate::lease::{LeaseGuard, LeaseManager};
use crate::ledger::TokenLedger;
use crate::revocation::RevocationCache;
use crate::session::{DeviceGroup, SessionDirectory};

/// Applies the device login policy and performs revocations.
///
/// Admission runs read-decide-write under a per-principal lease so that
/// concurrent logins across instances see each other's writes. Every
/// revocation updates the ledger and then the revocation cache, so
/// in-flight requests carrying the credential are rejected immediately.
#[derive(Debug, Clone)]
pub struct LoginPolicyEnforcer {
    /// Credential ledger.
    ledger: Arc<dyn TokenLedger>,
    /// Session projection over the ledger.
    directory: SessionDirectory,
    /// Blacklist.
    revocation: Arc<RevocationCache>,
    /// Per-principal admission lease.
    leases: Arc<LeaseManager>,
    /// Policy settings.
    settings: LoginPolicySettings,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl LoginPolicyEnforcer {
    /// Creates a new enforcer.
    pub fn new(
        ledger: Arc<dyn TokenLedger>,
        revocation: Arc<RevocationCache>,
        leases: Arc<LeaseManager>,
        settings: LoginPolicySettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let directory = SessionDirectory::new(Arc::clone(&ledger), Arc::clone(&clock));
        Self {
            ledger,
            directory,
            revocation,
            leases,
            settings,
            clock,
        }
    }

    /// A snapshot of the active settings.
    pub fn settings(&self) -> LoginPolicySettings {
        self.settings.clone()
    }

    /// Preview whether a login from `device_id` would be admitted now.
    ///
    /// Takes no lease and writes nothing; the binding decision is made
    /// again inside [`admit_login`](Self::admit_login).
    pub async fn check_login_policy(
        &self,
        subject: &str,
        device_id: Option<&str>,
    ) -> AppResult<PolicyCheck> {
        let groups = self.directory.device_groups(subject).await?;
        let check = match decide(&self.settings, &groups, device_id) {
            Decision::Reject { reason } => PolicyCheck {
                allowed: false,
                message: Some(reason),
            },
            Decision::Admit { evict, .. } if !evict.is_empty() => PolicyCheck {
                allowed: true,
                message: Some(format!(
                    "{} other device session(s) will be signed out",
                    evict.len()
                )),
            },
            Decision::Admit { .. } => PolicyCheck {
                allowed: true,
                message: None,
            },
        };
        Ok(check)
    }

    /// Check the policy and record the login as one atomic step per
    /// principal.
    ///
    /// Fails with `LeaseTimeout` if the principal's lease cannot be taken
    /// in time; a timeout is never treated as admission.
    pub async fn admit_login(&self, login: NewLogin) -> AppResult<AdmissionOutcome> {
        if login.credentials.is_empty() {
            return Err(AppError::validation("A login must carry at least one credential"));
        }

        let guard = self.leases.acquire(&keys::login_lease(&login.subject)).await?;
        let result = self.admit_under_lease(&guard, &login).await;

        if let Err(e) = guard.release().await {
            warn!(
                subject = %login.subject,
                error = %e,
                "Failed to release admission lease, leaving it to expire"
            );
        }
        result
    }

    async fn admit_under_lease(
        &self,
        guard: &LeaseGuard,
        login: &NewLogin,
    ) -> AppResult<AdmissionOutcome> {
        let groups = self.directory.device_groups(&login.subject).await?;
        let device_id = login.device.device_id.as_deref();

        let (refreshed, evict) = match decide(&self.settings, &groups, device_id) {
            Decision::Reject { reason } => {
                warn!(
                    subject = %login.subject,
                    device_id = ?device_id,
                    policy = %self.settings.new_device_policy,
                    "Login rejected by device policy"
                );
                return Ok(AdmissionOutcome::Rejected { reason });
            }
            Decision::Admit { refresh, evict } => (refresh, evict),
        };

        // Reading may have eaten into the lease; make sure the writes are covered.
        if !guard.extend().await? {
            return Err(AppError::lease_timeout(format!(
                "Admission lease for '{}' lapsed before the decision was applied",
                login.subject
            )));
        }

        let now = self.clock.now();
        let records = self.issue_records(login, now);
        let session_id = records[0].id;

        // The new login is written before anything is evicted; a conflict
        // or store failure here leaves the existing sessions untouched.
        self.ledger.record_all(&records).await?;

        let mut evicted = Vec::new();
        for group in groups.iter().filter(|g| evict.contains(&g.key)) {
            match self.evict_group(&login.subject, group).await {
                Ok(ids) => evicted.extend(ids),
                Err(e) => {
                    self.withdraw(&login.subject, &records).await;
                    return Err(e);
                }
            }
        }

        info!(
            subject = %login.subject,
            session_id = %session_id,
            device_id = ?device_id,
            refreshed,
            evicted = evicted.len(),
            "Login admitted"
        );

        Ok(AdmissionOutcome::Admitted(Admission {
            session_id,
            credentials: records,
            refreshed,
            evicted,
        }))
    }

    /// Build the ledger records of a login, all sharing the first
    /// credential's id as their login id.
    fn issue_records(&self, login: &NewLogin, now: DateTime<Utc>) -> Vec<CredentialRecord> {
        let mut records: Vec<CredentialRecord> = login
            .credentials
            .iter()
            .map(|c| c.to_record(&login.subject, &login.device, now, self.lifetime(c.kind)))
            .collect();
        if let Some(login_id) = records.first().map(|r| r.id) {
            for record in &mut records {
                record.login_id = login_id;
            }
        }
        records
    }

    /// Revoke the credentials of an admission that could not complete.
    async fn withdraw(&self, subject: &str, records: &[CredentialRecord]) {
        for record in records {
            if let Err(e) = self.revoke_credential(record).await {
                warn!(
                    subject = %subject,
                    credential_id = %record.id,
                    error = %e,
                    "Failed to withdraw credential of an incomplete admission"
                );
            }
        }
    }

    async fn evict_group(&self, subject: &str, group: &DeviceGroup) -> AppResult<Vec<Uuid>> {
        let mut revoked = Vec::with_capacity(group.credentials.len());
        for credential in &group.credentials {
            if self.revoke_credential(credential).await? {
                revoked.push(credential.id);
            }
        }
        info!(
            subject = %subject,
            device_id = ?group.device_id,
            login_at = %group.login_at,
            credentials = revoked.len(),
            "Evicted oldest device session"
        );
        Ok(revoked)
    }

    /// Sessions of `subject`, flagging `current` as the caller's own.
    pub async fn get_user_sessions(
        &self,
        subject: &str,
        current: Option<Uuid>,
    ) -> AppResult<Vec<Session>> {
        self.directory.sessions(subject, current).await
    }

    /// Revoke one credential. An unknown or already revoked id affects
    /// nothing and is not an error.
    pub async fn revoke_token(&self, id: Uuid) -> AppResult<RevocationOutcome> {
        let Some(record) = self.ledger.find(id).await? else {
            debug!(credential_id = %id, "Revoke requested for unknown credential");
            return Ok(RevocationOutcome::default());
        };

        let changed = self.revoke_credential(&record).await?;
        if changed {
            info!(
                subject = %record.subject,
                credential_id = %id,
                "Credential revoked"
            );
        }
        Ok(RevocationOutcome {
            affected: changed as u64,
        })
    }

    /// Revoke every valid credential `subject` holds on `device_id`.
    pub async fn revoke_device_tokens(
        &self,
        subject: &str,
        device_id: &str,
    ) -> AppResult<RevocationOutcome> {
        let records = self
            .ledger
            .list_valid_by_principal(subject, self.clock.now())
            .await?;

        let mut affected = 0u64;
        for record in records.iter().filter(|r| r.is_on_device(device_id)) {
            if self.revoke_credential(record).await? {
                affected += 1;
            }
        }

        info!(
            subject = %subject,
            device_id = %device_id,
            affected,
            "Device credentials revoked"
        );
        Ok(RevocationOutcome { affected })
    }

    /// Revoke everything `subject` holds with a single principal marker.
    pub async fn revoke_all_user_tokens(&self, subject: &str) -> AppResult<RevocationOutcome> {
        let as_of = self.clock.now();
        self.revocation.blacklist_principal(subject, as_of).await?;
        let affected = self.ledger.mark_revoked_all(subject, as_of).await?;

        info!(
            subject = %subject,
            affected,
            revoked_before = %as_of,
            "All credentials revoked"
        );
        Ok(RevocationOutcome { affected })
    }

    /// Ledger transition followed by the matching blacklist entry.
    ///
    /// The marker is (re)written even when the ledger row was already
    /// revoked, so a revocation whose cache write failed earlier can be
    /// repaired by repeating it.
    async fn revoke_credential(&self, record: &CredentialRecord) -> AppResult<bool> {
        let changed = self.ledger.mark_revoked(record.id).await?;
        self.revocation
            .blacklist(&record.reference_id, record.expires_at)
            .await?;
        Ok(changed)
    }

    fn lifetime(&self, kind: CredentialKind) -> Duration {
        match kind {
            CredentialKind::Access => self.settings.access_token_ttl(),
            CredentialKind::Refresh => self.settings.refresh_token_ttl(),
            CredentialKind::Id => self.settings.id_token_ttl(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::MemoryLeaseProvider;
    use crate::ledger::MemoryTokenLedger;
    use crate::revocation::cache::tests::memory_cache;
    use authgate_core::config::{LeaseConfig, NewDevicePolicy, StoreFailureMode};
    use authgate_core::error::ErrorKind;
    use authgate_core::traits::ManualClock;
    use authgate_entity::credential::{CredentialStatus, DeviceInfo};
    use chrono::Utc;

    struct Fixture {
        clock: Arc<ManualClock>,
        ledger: Arc<MemoryTokenLedger>,
        revocation: Arc<RevocationCache>,
        enforcer: LoginPolicyEnforcer,
    }

    fn fixture(max_devices: u32, policy: NewDevicePolicy) -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger = Arc::new(MemoryTokenLedger::new());
        let settings = LoginPolicySettings {
            max_devices,
            new_device_policy: policy,
            ..LoginPolicySettings::default()
        };
        let revocation = Arc::new(RevocationCache::new(
            memory_cache(),
            clock.clone(),
            StoreFailureMode::FailClosed,
            settings.max_credential_lifetime(),
        ));
        let leases = Arc::new(LeaseManager::new(
            Arc::new(MemoryLeaseProvider::new()),
            LeaseConfig::default(),
        ));
        let enforcer = LoginPolicyEnforcer::new(
            ledger.clone(),
            revocation.clone(),
            leases,
            settings,
            clock.clone(),
        );
        Fixture {
            clock,
            ledger,
            revocation,
            enforcer,
        }
    }

    fn login(device: &str) -> NewLogin {
        NewLogin::new("alice", DeviceInfo::with_id(device))
            .with_credential(CredentialKind::Access, format!("{device}-{}", Uuid::new_v4()))
    }

    async fn admit(f: &Fixture, device: &str) -> AdmissionOutcome {
        let outcome = f.enforcer.admit_login(login(device)).await.unwrap();
        f.clock.advance(Duration::seconds(1));
        outcome
    }

    #[tokio::test]
    async fn test_evict_oldest_revokes_and_blacklists() {
        let f = fixture(2, NewDevicePolicy::EvictOldest);
        let a = admit(&f, "a").await.admitted().cloned().unwrap();
        admit(&f, "b").await;
        let c = admit(&f, "c").await.admitted().cloned().unwrap();

        assert_eq!(c.evicted, vec![a.session_id]);
        let stored = f.ledger.find(a.session_id).await.unwrap().unwrap();
        assert_eq!(stored.status, CredentialStatus::Revoked);
        assert!(
            f.revocation
                .is_blacklisted(&a.credentials[0].reference_id)
                .await
                .unwrap()
        );
        assert_eq!(f.enforcer.get_user_sessions("alice", None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deny_rejects_at_cap_and_preview_agrees() {
        let f = fixture(1, NewDevicePolicy::Deny);
        admit(&f, "a").await;

        let check = f.enforcer.check_login_policy("alice", Some("b")).await.unwrap();
        assert!(!check.allowed);
        assert!(check.message.is_some());

        let outcome = admit(&f, "b").await;
        assert!(matches!(outcome, AdmissionOutcome::Rejected { .. }));
        assert!(f.enforcer.check_login_policy("alice", Some("a")).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_same_device_relogin_is_refresh() {
        let f = fixture(1, NewDevicePolicy::EvictOldest);
        let first = admit(&f, "a").await.admitted().cloned().unwrap();
        let second = admit(&f, "a").await.admitted().cloned().unwrap();

        assert!(second.refreshed);
        assert!(second.evicted.is_empty());
        let stored = f.ledger.find(first.session_id).await.unwrap().unwrap();
        assert_eq!(stored.status, CredentialStatus::Valid);
    }

    #[tokio::test]
    async fn test_empty_login_is_invalid() {
        let f = fixture(0, NewDevicePolicy::Allow);
        let err = f
            .enforcer
            .admit_login(NewLogin::new("alice", DeviceInfo::default()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_revocations_are_idempotent_and_counted() {
        let f = fixture(0, NewDevicePolicy::Allow);
        let a = admit(&f, "a").await.admitted().cloned().unwrap();
        admit(&f, "b").await;
        admit(&f, "b").await;

        assert_eq!(f.enforcer.revoke_token(a.session_id).await.unwrap().affected, 1);
        assert_eq!(f.enforcer.revoke_token(a.session_id).await.unwrap().affected, 0);
        assert_eq!(f.enforcer.revoke_token(Uuid::new_v4()).await.unwrap().affected, 0);

        assert_eq!(
            f.enforcer.revoke_device_tokens("alice", "b").await.unwrap().affected,
            2
        );
        assert!(f.enforcer.get_user_sessions("alice", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revoke_all_writes_one_principal_marker() {
        let f = fixture(0, NewDevicePolicy::Allow);
        admit(&f, "a").await;
        admit(&f, "b").await;

        let outcome = f.enforcer.revoke_all_user_tokens("alice").await.unwrap();
        assert_eq!(outcome.affected, 2);
        assert_eq!(
            f.revocation.is_principal_blacklisted("alice").await.unwrap(),
            Some(f.clock.now())
        );

        // Logins after the cutoff are unaffected.
        f.clock.advance(Duration::seconds(1));
        let later = admit(&f, "c").await;
        assert!(later.admitted().is_some());
        assert_eq!(f.enforcer.get_user_sessions("alice", None).await.unwrap().len(), 1);
    }
}
