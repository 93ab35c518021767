//! Lease provider trait for cross-instance mutual exclusion.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// A time-bounded exclusive hold on a key.
///
/// Implementations must make `try_acquire` atomic across every process
/// sharing the backend, and must only release or extend a lease when the
/// caller presents the token it was granted with. A lease whose TTL
/// elapses is free again without any further call.
#[async_trait]
pub trait LeaseProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Try once to take the lease on `key` for `ttl`, identified by `token`.
    ///
    /// Returns `true` if the lease was granted.
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool>;

    /// Push the expiry of a held lease to `ttl` from now.
    ///
    /// Returns `false` if the lease is no longer held under `token`.
    async fn extend(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool>;

    /// Release a held lease.
    ///
    /// Returns `false` if the lease had already lapsed or changed hands.
    async fn release(&self, key: &str, token: &str) -> AppResult<bool>;
}
