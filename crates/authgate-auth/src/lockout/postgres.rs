//! Postgres-backed lockout store wrapping the lockout repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use authgate_core::result::AppResult;
use authgate_database::repositories::lockout::LockoutRepository;
use authgate_entity::lockout::LockoutRecord;

use super::store::LockoutStore;

/// Lockout counters stored in the `login_lockouts` table.
#[derive(Debug, Clone)]
pub struct PgLockoutStore {
    /// Lockout database repository.
    repo: Arc<LockoutRepository>,
}

impl PgLockoutStore {
    /// Creates a new store over the given repository.
    pub fn new(repo: Arc<LockoutRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl LockoutStore for PgLockoutStore {
    async fn get(&self, username: &str) -> AppResult<Option<LockoutRecord>> {
        self.repo.find(username).await
    }

    async fn increment(&self, username: &str, now: DateTime<Utc>) -> AppResult<LockoutRecord> {
        self.repo.increment(username, now).await
    }

    async fn lock_until(
        &self,
        username: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LockoutRecord>> {
        self.repo.lock_until(username, until, now).await
    }

    async fn clear(&self, username: &str) -> AppResult<bool> {
        self.repo.clear(username).await
    }

    async fn list_locked(&self, now: DateTime<Utc>) -> AppResult<Vec<LockoutRecord>> {
        self.repo.find_locked(now).await
    }

    async fn sweep_elapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.repo.delete_elapsed(now).await
    }
}
