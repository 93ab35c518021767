//! The credential usability predicate.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use authgate_core::result::AppResult;
use authgate_core::traits::Clock;
use authgate_entity::credential::{CredentialRecord, CredentialStatus};

use crate::revocation::RevocationCache;

/// Why a credential can or cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usability {
    /// All checks passed.
    Usable,
    /// Past its expiry.
    Expired,
    /// Revoked in the ledger.
    Revoked,
    /// Consumed by a one-time exchange.
    Redeemed,
    /// Its reference id is blacklisted.
    Blacklisted,
    /// Issued before the principal's revoke-all cutoff.
    PrincipalRevoked,
}

impl Usability {
    /// Whether the credential may be used.
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable)
    }
}

/// Decides whether credentials may be used.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    /// Blacklist.
    revocation: Arc<RevocationCache>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl CredentialValidator {
    /// Creates a new validator.
    pub fn new(revocation: Arc<RevocationCache>, clock: Arc<dyn Clock>) -> Self {
        Self { revocation, clock }
    }

    /// Full check of a ledger record: status, expiry, and both kinds of
    /// revocation marker.
    pub async fn validate(&self, record: &CredentialRecord) -> AppResult<Usability> {
        match record.status {
            CredentialStatus::Revoked => return Ok(Usability::Revoked),
            CredentialStatus::Redeemed => return Ok(Usability::Redeemed),
            CredentialStatus::Valid => {}
        }
        self.check_presented(
            &record.reference_id,
            &record.subject,
            record.created_at,
            record.expires_at,
        )
        .await
    }

    /// Hot-path check of a presented credential using only what it carries.
    /// Never reads the ledger.
    pub async fn check_presented(
        &self,
        reference_id: &str,
        subject: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Usability> {
        if self.clock.now() >= expires_at {
            return Ok(Usability::Expired);
        }

        if self.revocation.is_blacklisted(reference_id).await? {
            debug!(reference_id = %reference_id, "Rejected blacklisted credential");
            return Ok(Usability::Blacklisted);
        }

        if let Some(revoked_before) = self.revocation.is_principal_blacklisted(subject).await? {
            if issued_at < revoked_before {
                debug!(subject = %subject, "Rejected credential issued before revoke-all");
                return Ok(Usability::PrincipalRevoked);
            }
        }

        Ok(Usability::Usable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revocation::cache::tests::memory_cache;
    use authgate_core::config::StoreFailureMode;
    use authgate_core::traits::ManualClock;
    use authgate_entity::credential::{CredentialKind, DeviceInfo};
    use chrono::Duration;

    fn setup() -> (Arc<ManualClock>, Arc<RevocationCache>, CredentialValidator) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let revocation = Arc::new(RevocationCache::new(
            memory_cache(),
            clock.clone(),
            StoreFailureMode::FailClosed,
            Duration::hours(24),
        ));
        let validator = CredentialValidator::new(revocation.clone(), clock.clone());
        (clock, revocation, validator)
    }

    fn record(at: DateTime<Utc>) -> CredentialRecord {
        CredentialRecord::issue(
            "alice",
            CredentialKind::Access,
            "ref-1",
            DeviceInfo::default(),
            at,
            Duration::minutes(15),
        )
    }

    #[tokio::test]
    async fn test_usable_until_expiry() {
        let (clock, _, validator) = setup();
        let cred = record(clock.now());
        assert_eq!(validator.validate(&cred).await.unwrap(), Usability::Usable);

        clock.advance(Duration::minutes(15));
        assert_eq!(validator.validate(&cred).await.unwrap(), Usability::Expired);
    }

    #[tokio::test]
    async fn test_ledger_status_wins() {
        let (clock, _, validator) = setup();
        let mut cred = record(clock.now());
        cred.status = CredentialStatus::Redeemed;
        assert_eq!(validator.validate(&cred).await.unwrap(), Usability::Redeemed);
        cred.status = CredentialStatus::Revoked;
        assert!(!validator.validate(&cred).await.unwrap().is_usable());
    }

    #[tokio::test]
    async fn test_markers_reject_presented_credentials() {
        let (clock, revocation, validator) = setup();
        let cred = record(clock.now());

        revocation.blacklist("ref-1", cred.expires_at).await.unwrap();
        assert_eq!(validator.validate(&cred).await.unwrap(), Usability::Blacklisted);

        let other = CredentialRecord::issue(
            "alice",
            CredentialKind::Refresh,
            "ref-2",
            DeviceInfo::default(),
            clock.now(),
            Duration::hours(1),
        );
        clock.advance(Duration::seconds(1));
        revocation.blacklist_principal("alice", clock.now()).await.unwrap();
        assert_eq!(
            validator
                .check_presented("ref-2", "alice", other.created_at, other.expires_at)
                .await
                .unwrap(),
            Usability::PrincipalRevoked
        );
        assert_eq!(
            validator
                .check_presented("ref-3", "alice", clock.now(), other.expires_at)
                .await
                .unwrap(),
            Usability::Usable
        );
    }
}
