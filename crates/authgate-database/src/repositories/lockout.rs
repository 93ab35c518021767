//! Login lockout repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use authgate_core::result::AppResult;
use authgate_entity::lockout::LockoutRecord;

use super::map_db_err;

/// Repository for the `login_lockouts` table.
#[derive(Debug, Clone)]
pub struct LockoutRepository {
    pool: PgPool,
}

impl LockoutRepository {
    /// Create a new lockout repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the record for a principal.
    pub async fn find(&self, username: &str) -> AppResult<Option<LockoutRecord>> {
        sqlx::query_as::<_, LockoutRecord>("SELECT * FROM login_lockouts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err("Failed to find lockout record"))
    }

    /// Atomically add one failure. An elapsed lockout restarts the count
    /// at one.
    pub async fn increment(&self, username: &str, now: DateTime<Utc>) -> AppResult<LockoutRecord> {
        sqlx::query_as::<_, LockoutRecord>(
            "INSERT INTO login_lockouts (username, failed_count, lockout_until, updated_at) \
             VALUES ($1, 1, NULL, $2) \
             ON CONFLICT (username) DO UPDATE SET \
               failed_count = CASE WHEN login_lockouts.lockout_until <= $2 THEN 1 \
                                   ELSE login_lockouts.failed_count + 1 END, \
               lockout_until = CASE WHEN login_lockouts.lockout_until <= $2 THEN NULL \
                                    ELSE login_lockouts.lockout_until END, \
               updated_at = $2 \
             RETURNING *",
        )
        .bind(username)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err("Failed to record failed login"))
    }

    /// Impose a lockout unless one is already active. Returns the stored
    /// record, or `None` if it was cleared concurrently.
    pub async fn lock_until(
        &self,
        username: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LockoutRecord>> {
        sqlx::query_as::<_, LockoutRecord>(
            "UPDATE login_lockouts SET \
               lockout_until = CASE WHEN lockout_until IS NULL OR lockout_until <= $3 THEN $2 \
                                    ELSE lockout_until END, \
               updated_at = $3 \
             WHERE username = $1 RETURNING *",
        )
        .bind(username)
        .bind(until)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err("Failed to impose lockout"))
    }

    /// Remove a principal's record. Returns whether one existed.
    pub async fn clear(&self, username: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM login_lockouts WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(map_db_err("Failed to clear lockout record"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete records whose lockout has elapsed.
    pub async fn delete_elapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM login_lockouts WHERE lockout_until <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_db_err("Failed to delete elapsed lockouts"))?;
        Ok(result.rows_affected())
    }

    /// List principals currently locked out.
    pub async fn find_locked(&self, now: DateTime<Utc>) -> AppResult<Vec<LockoutRecord>> {
        sqlx::query_as::<_, LockoutRecord>(
            "SELECT * FROM login_lockouts WHERE lockout_until > $1 ORDER BY lockout_until ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("Failed to list locked principals"))
    }
}
