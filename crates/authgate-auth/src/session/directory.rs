//! Session views over the token ledger.

use std::sync::Arc;

use uuid::Uuid;

use authgate_core::result::AppResult;
use authgate_core::traits::Clock;
use authgate_entity::session::Session;

use super::device::{DeviceGroup, group_by_device};
use crate::ledger::TokenLedger;

/// Read-only projection of a principal's valid credentials.
///
/// Sessions have no storage of their own: one exists for every valid,
/// unexpired credential and vanishes when that credential leaves the
/// valid state.
#[derive(Debug, Clone)]
pub struct SessionDirectory {
    /// Credential ledger.
    ledger: Arc<dyn TokenLedger>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl SessionDirectory {
    /// Creates a new session directory.
    pub fn new(ledger: Arc<dyn TokenLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// Sessions of `subject`, oldest first. The session whose id equals
    /// `current` is flagged as the caller's own.
    pub async fn sessions(&self, subject: &str, current: Option<Uuid>) -> AppResult<Vec<Session>> {
        let records = self
            .ledger
            .list_valid_by_principal(subject, self.clock.now())
            .await?;
        Ok(records
            .iter()
            .map(|record| Session::from_credential(record, current))
            .collect())
    }

    /// Valid credentials of `subject` grouped by device, oldest first.
    pub async fn device_groups(&self, subject: &str) -> AppResult<Vec<DeviceGroup>> {
        let records = self
            .ledger
            .list_valid_by_principal(subject, self.clock.now())
            .await?;
        Ok(group_by_device(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryTokenLedger;
    use authgate_core::traits::ManualClock;
    use authgate_entity::credential::{CredentialKind, CredentialRecord, DeviceInfo};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_sessions_follow_credential_validity() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger = Arc::new(MemoryTokenLedger::new());
        let directory = SessionDirectory::new(ledger.clone(), clock.clone());

        let laptop = CredentialRecord::issue(
            "alice",
            CredentialKind::Access,
            "laptop-ref",
            DeviceInfo::with_id("laptop"),
            clock.now(),
            Duration::minutes(15),
        );
        let phone = CredentialRecord::issue(
            "alice",
            CredentialKind::Access,
            "phone-ref",
            DeviceInfo::with_id("phone"),
            clock.now() + Duration::seconds(1),
            Duration::minutes(15),
        );
        ledger.record(&laptop).await.unwrap();
        ledger.record(&phone).await.unwrap();

        let sessions = directory.sessions("alice", Some(phone.id)).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, laptop.id);
        assert!(!sessions[0].is_current);
        assert!(sessions[1].is_current);
        assert_eq!(sessions[1].last_active_at, phone.created_at);

        ledger.mark_revoked(laptop.id).await.unwrap();
        let sessions = directory.sessions("alice", None).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(directory.device_groups("alice").await.unwrap().len(), 1);

        clock.advance(Duration::minutes(16));
        assert!(directory.sessions("alice", None).await.unwrap().is_empty());
    }
}
