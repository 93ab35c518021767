//! In-memory token ledger using a Tokio lock for single-node deployments.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_entity::credential::{CredentialRecord, CredentialStatus};

use super::TokenLedger;

/// Internal state for the memory-based ledger.
#[derive(Debug, Default)]
struct InnerState {
    /// Records by internal id.
    records: HashMap<Uuid, CredentialRecord>,
    /// Reference id to internal id.
    by_reference: HashMap<String, Uuid>,
}

impl InnerState {
    fn transition(&mut self, id: Uuid, next: CredentialStatus) -> bool {
        match self.records.get_mut(&id) {
            Some(record) if record.status.can_transition_to(next) => {
                record.status = next;
                true
            }
            _ => false,
        }
    }
}

/// In-memory token ledger.
///
/// Suitable for single-node deployments and tests only; nothing survives
/// a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenLedger {
    /// Protected inner state.
    state: Arc<RwLock<InnerState>>,
}

impl MemoryTokenLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently held, whatever their status.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Whether the ledger holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenLedger for MemoryTokenLedger {
    async fn record(&self, credential: &CredentialRecord) -> AppResult<()> {
        self.record_all(std::slice::from_ref(credential)).await
    }

    async fn record_all(&self, credentials: &[CredentialRecord]) -> AppResult<()> {
        let mut state = self.state.write().await;

        let mut ids = HashSet::new();
        let mut references = HashSet::new();
        for credential in credentials {
            if state.records.contains_key(&credential.id) || !ids.insert(credential.id) {
                return Err(AppError::conflict(format!(
                    "Credential {} already recorded",
                    credential.id
                )));
            }
            if state.by_reference.contains_key(&credential.reference_id)
                || !references.insert(credential.reference_id.as_str())
            {
                return Err(AppError::conflict(format!(
                    "Reference id '{}' already recorded",
                    credential.reference_id
                )));
            }
        }

        for credential in credentials {
            state
                .by_reference
                .insert(credential.reference_id.clone(), credential.id);
            state.records.insert(credential.id, credential.clone());
        }
        Ok(())
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<CredentialRecord>> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn find_by_reference_id(
        &self,
        reference_id: &str,
    ) -> AppResult<Option<CredentialRecord>> {
        let state = self.state.read().await;
        Ok(state
            .by_reference
            .get(reference_id)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn list_valid_by_principal(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CredentialRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<CredentialRecord> = state
            .records
            .values()
            .filter(|r| r.subject == subject && r.is_live(now))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn mark_revoked(&self, id: Uuid) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .transition(id, CredentialStatus::Revoked))
    }

    async fn mark_revoked_all(&self, subject: &str, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let mut count = 0u64;
        for record in state.records.values_mut() {
            if record.subject == subject
                && record.status == CredentialStatus::Valid
                && record.created_at < before
            {
                record.status = CredentialStatus::Revoked;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn mark_redeemed(&self, id: Uuid) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .transition(id, CredentialStatus::Redeemed))
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.records.get_mut(&id) {
            Some(record) => {
                if record.last_active_at.is_none_or(|last| last < at) {
                    record.last_active_at = Some(at);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let expired: Vec<(Uuid, String)> = state
            .records
            .values()
            .filter(|r| r.is_expired(now))
            .map(|r| (r.id, r.reference_id.clone()))
            .collect();

        for (id, reference_id) in &expired {
            state.records.remove(id);
            state.by_reference.remove(reference_id);
        }
        Ok(expired.len() as u64)
    }
}
