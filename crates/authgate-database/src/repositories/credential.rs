//! Credential repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;
use authgate_entity::credential::{CredentialRecord, CredentialStatus};

use super::map_db_err;

/// Repository for the `credentials` table.
#[derive(Debug, Clone)]
pub struct CredentialRepository {
    pool: PgPool,
}

impl CredentialRepository {
    /// Create a new credential repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new credential. Fails with `Conflict` if the id or
    /// reference id already exists.
    pub async fn insert(&self, record: &CredentialRecord) -> AppResult<()> {
        insert_row(&self.pool, record).await
    }

    /// Insert every credential in one transaction. Either all rows are
    /// written or none are.
    pub async fn insert_all(&self, records: &[CredentialRecord]) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_err("Failed to begin credential transaction"))?;

        for record in records {
            insert_row(&mut *tx, record).await?;
        }

        tx.commit()
            .await
            .map_err(map_db_err("Failed to commit credentials"))?;
        Ok(())
    }

    /// Find a credential by internal id.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CredentialRecord>> {
        sqlx::query_as::<_, CredentialRecord>("SELECT * FROM credentials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err("Failed to find credential"))
    }

    /// Find a credential by its presentable reference id.
    pub async fn find_by_reference_id(
        &self,
        reference_id: &str,
    ) -> AppResult<Option<CredentialRecord>> {
        sqlx::query_as::<_, CredentialRecord>("SELECT * FROM credentials WHERE reference_id = $1")
            .bind(reference_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err("Failed to find credential by reference id"))
    }

    /// Valid, unexpired credentials of a subject, oldest first.
    pub async fn find_valid_by_subject(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CredentialRecord>> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT * FROM credentials WHERE subject = $1 AND status = 'valid' AND expires_at > $2 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(subject)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("Failed to list valid credentials"))
    }

    /// Move a valid credential to `status`. Returns `false` when the
    /// credential is missing or already left the valid state.
    pub async fn transition(&self, id: Uuid, status: CredentialStatus) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE credentials SET status = $2 WHERE id = $1 AND status = 'valid'",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(map_db_err("Failed to update credential status"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every valid credential of a subject created before `before`.
    /// Returns the ids that changed.
    pub async fn revoke_all_before(
        &self,
        subject: &str,
        before: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE credentials SET status = 'revoked' \
             WHERE subject = $1 AND status = 'valid' AND created_at < $2 RETURNING id",
        )
        .bind(subject)
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("Failed to revoke credentials"))
    }

    /// Record activity on a credential. Never moves the timestamp backwards.
    pub async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE credentials SET last_active_at = GREATEST(COALESCE(last_active_at, $2), $2) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err("Failed to touch credential"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete credentials past their expiry, whatever their status.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM credentials WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_db_err("Failed to delete expired credentials"))?;
        Ok(result.rows_affected())
    }
}

async fn insert_row<'c, E>(executor: E, record: &CredentialRecord) -> AppResult<()>
where
    E: PgExecutor<'c>,
{
    sqlx::query(
        "INSERT INTO credentials (id, login_id, subject, application_id, authorization_id, kind, \
         status, payload_ref, reference_id, expires_at, created_at, last_active_at, \
         device_id, device_kind, device_name, origin_address) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(record.id)
    .bind(record.login_id)
    .bind(&record.subject)
    .bind(&record.application_id)
    .bind(&record.authorization_id)
    .bind(record.kind)
    .bind(record.status)
    .bind(&record.payload_ref)
    .bind(&record.reference_id)
    .bind(record.expires_at)
    .bind(record.created_at)
    .bind(record.last_active_at)
    .bind(&record.device_id)
    .bind(&record.device_kind)
    .bind(&record.device_name)
    .bind(&record.origin_address)
    .execute(executor)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::with_source(
                ErrorKind::Conflict,
                format!(
                    "Credential {} or reference id '{}' already recorded",
                    record.id, record.reference_id
                ),
                e,
            )
        } else {
            map_db_err("Failed to insert credential")(e)
        }
    })?;
    Ok(())
}

/// Whether a sqlx error is a Postgres unique-constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}
