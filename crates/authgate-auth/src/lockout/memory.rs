//! In-memory lockout store for single-node deployments.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use authgate_core::result::AppResult;
use authgate_entity::lockout::LockoutRecord;

use super::store::LockoutStore;

/// Lockout counters held in a concurrent map. Each operation locks only
/// the shard owning the principal's entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockoutStore {
    records: Arc<DashMap<String, LockoutRecord>>,
}

impl MemoryLockoutStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockoutStore for MemoryLockoutStore {
    async fn get(&self, username: &str) -> AppResult<Option<LockoutRecord>> {
        Ok(self.records.get(username).map(|r| r.value().clone()))
    }

    async fn increment(&self, username: &str, now: DateTime<Utc>) -> AppResult<LockoutRecord> {
        let mut entry = self
            .records
            .entry(username.to_string())
            .or_insert_with(|| LockoutRecord::clean(username, now));

        let record = entry.value_mut();
        if record.lockout_elapsed(now) {
            record.failed_count = 0;
            record.lockout_until = None;
        }
        record.failed_count += 1;
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn lock_until(
        &self,
        username: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LockoutRecord>> {
        Ok(self.records.get_mut(username).map(|mut entry| {
            let record = entry.value_mut();
            if !record.is_locked(now) {
                record.lockout_until = Some(until);
            }
            record.updated_at = now;
            record.clone()
        }))
    }

    async fn clear(&self, username: &str) -> AppResult<bool> {
        Ok(self.records.remove(username).is_some())
    }

    async fn list_locked(&self, now: DateTime<Utc>) -> AppResult<Vec<LockoutRecord>> {
        let mut locked: Vec<LockoutRecord> = self
            .records
            .iter()
            .filter(|entry| entry.value().is_locked(now))
            .map(|entry| entry.value().clone())
            .collect();
        locked.sort_by_key(|r| r.lockout_until);
        Ok(locked)
    }

    async fn sweep_elapsed(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut removed = 0u64;
        self.records.retain(|_, record| {
            let elapsed = record.lockout_elapsed(now);
            if elapsed {
                removed += 1;
            }
            !elapsed
        });
        Ok(removed)
    }
}
