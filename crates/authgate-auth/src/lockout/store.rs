//! Lockout counter store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use authgate_core::result::AppResult;
use authgate_entity::lockout::LockoutRecord;

/// Storage for per-principal failure counters.
///
/// Every method is a single atomic step against the backend; none of them
/// needs a cross-instance lock.
#[async_trait]
pub trait LockoutStore: Send + Sync + std::fmt::Debug + 'static {
    /// The record for `username`, if any.
    async fn get(&self, username: &str) -> AppResult<Option<LockoutRecord>>;

    /// Add one failure. A lockout that has elapsed by `now` is discarded
    /// and the count restarts at one.
    async fn increment(&self, username: &str, now: DateTime<Utc>) -> AppResult<LockoutRecord>;

    /// Set `lockout_until` unless a lockout is already active at `now`.
    /// Returns `None` if the record no longer exists.
    async fn lock_until(
        &self,
        username: &str,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<LockoutRecord>>;

    /// Drop the counter and any lockout. Returns whether a record existed.
    async fn clear(&self, username: &str) -> AppResult<bool>;

    /// Principals locked out at `now`.
    async fn list_locked(&self, now: DateTime<Utc>) -> AppResult<Vec<LockoutRecord>>;

    /// Physically remove records whose lockout has elapsed.
    async fn sweep_elapsed(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
