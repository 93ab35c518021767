//! Postgres-backed token ledger wrapping the credential repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use authgate_core::result::AppResult;
use authgate_database::repositories::credential::CredentialRepository;
use authgate_entity::credential::{CredentialRecord, CredentialStatus};

use super::TokenLedger;

/// Token ledger stored in Postgres.
#[derive(Debug, Clone)]
pub struct PgTokenLedger {
    /// Credential database repository.
    repo: Arc<CredentialRepository>,
}

impl PgTokenLedger {
    /// Creates a new ledger over the given repository.
    pub fn new(repo: Arc<CredentialRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl TokenLedger for PgTokenLedger {
    async fn record(&self, credential: &CredentialRecord) -> AppResult<()> {
        self.repo.insert(credential).await
    }

    async fn record_all(&self, credentials: &[CredentialRecord]) -> AppResult<()> {
        self.repo.insert_all(credentials).await
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<CredentialRecord>> {
        self.repo.find_by_id(id).await
    }

    async fn find_by_reference_id(
        &self,
        reference_id: &str,
    ) -> AppResult<Option<CredentialRecord>> {
        self.repo.find_by_reference_id(reference_id).await
    }

    async fn list_valid_by_principal(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CredentialRecord>> {
        self.repo.find_valid_by_subject(subject, now).await
    }

    async fn mark_revoked(&self, id: Uuid) -> AppResult<bool> {
        self.repo.transition(id, CredentialStatus::Revoked).await
    }

    async fn mark_revoked_all(&self, subject: &str, before: DateTime<Utc>) -> AppResult<u64> {
        let ids = self.repo.revoke_all_before(subject, before).await?;
        debug!(subject = %subject, count = ids.len(), "Revoked credentials in ledger");
        Ok(ids.len() as u64)
    }

    async fn mark_redeemed(&self, id: Uuid) -> AppResult<bool> {
        self.repo.transition(id, CredentialStatus::Redeemed).await
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        self.repo.touch(id, at).await
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.repo.delete_expired(now).await
    }
}
