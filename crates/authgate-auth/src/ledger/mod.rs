//! Token ledger: the durable source of truth for issued credentials.
//!
//! Two backends are provided:
//! - [`PgTokenLedger`] over the `credentials` table (multi-instance)
//! - [`MemoryTokenLedger`] behind a Tokio lock (single process, tests)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use authgate_core::result::AppResult;
use authgate_entity::credential::CredentialRecord;

pub use memory::MemoryTokenLedger;
pub use postgres::PgTokenLedger;

/// Persistence contract for issued credentials.
///
/// Status transitions only ever leave `valid`. Transition methods return
/// `false` instead of failing when the credential is missing or already
/// revoked or redeemed, so repeating them is harmless.
#[async_trait]
pub trait TokenLedger: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a newly issued credential. Fails with `Conflict` when the id
    /// or reference id is already recorded.
    async fn record(&self, credential: &CredentialRecord) -> AppResult<()>;

    /// Persist the credentials of one login atomically. On any failure,
    /// including a `Conflict`, nothing is recorded.
    async fn record_all(&self, credentials: &[CredentialRecord]) -> AppResult<()>;

    /// Look a credential up by internal id.
    async fn find(&self, id: Uuid) -> AppResult<Option<CredentialRecord>>;

    /// Look a credential up by its presentable reference id.
    async fn find_by_reference_id(&self, reference_id: &str)
    -> AppResult<Option<CredentialRecord>>;

    /// Valid credentials of `subject` unexpired at `now`, ordered by
    /// creation instant then id, ascending.
    async fn list_valid_by_principal(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CredentialRecord>>;

    /// Move a valid credential to `revoked`.
    async fn mark_revoked(&self, id: Uuid) -> AppResult<bool>;

    /// Revoke every valid credential of `subject` created strictly before
    /// `before`. Returns how many changed.
    async fn mark_revoked_all(&self, subject: &str, before: DateTime<Utc>) -> AppResult<u64>;

    /// Move a valid credential to `redeemed` after a one-time exchange.
    async fn mark_redeemed(&self, id: Uuid) -> AppResult<bool>;

    /// Record activity on a credential.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    /// Delete rows past their expiry. Safe to run alongside anything else.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
