//! Lease acquisition with bounded waiting and guaranteed release.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};
use uuid::Uuid;

use authgate_core::config::LeaseConfig;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::traits::LeaseProvider;

/// Acquires leases on behalf of callers, retrying until a deadline.
#[derive(Debug, Clone)]
pub struct LeaseManager {
    /// Lease backend.
    provider: Arc<dyn LeaseProvider>,
    /// Timing configuration.
    config: LeaseConfig,
}

impl LeaseManager {
    /// Creates a new lease manager.
    pub fn new(provider: Arc<dyn LeaseProvider>, config: LeaseConfig) -> Self {
        Self { provider, config }
    }

    /// Take the lease on `key`, polling every `retry_interval` until
    /// `wait_timeout` has passed.
    ///
    /// Fails with `LeaseTimeout` if the lease stays held by someone else,
    /// and with a store error if the backend cannot be reached.
    pub async fn acquire(&self, key: &str) -> AppResult<LeaseGuard> {
        let token = Uuid::new_v4().to_string();
        let ttl = self.config.ttl();
        let deadline = Instant::now() + self.config.wait_timeout();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if self.provider.try_acquire(key, &token, ttl).await? {
                debug!(key = %key, attempts, "Lease acquired");
                return Ok(LeaseGuard {
                    provider: Arc::clone(&self.provider),
                    key: key.to_string(),
                    token,
                    ttl,
                    released: false,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(key = %key, attempts, "Timed out waiting for lease");
                return Err(AppError::lease_timeout(format!(
                    "Timed out after {}ms waiting for lease '{key}'",
                    self.config.wait_timeout_ms
                )));
            }
            sleep(self.config.retry_interval().min(deadline - now)).await;
        }
    }
}

/// A held lease.
///
/// Call [`LeaseGuard::release`] on every normal exit. If the guard is
/// dropped unreleased (an early return or a cancelled task) the release is
/// spawned onto the current runtime; failing that, the lease lapses at
/// its TTL.
pub struct LeaseGuard {
    provider: Arc<dyn LeaseProvider>,
    key: String,
    token: String,
    ttl: Duration,
    released: bool,
}

impl std::fmt::Debug for LeaseGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseGuard")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .field("released", &self.released)
            .finish()
    }
}

impl LeaseGuard {
    /// The leased key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Push the lease expiry a full TTL out from now.
    ///
    /// Returns `false` if the lease already lapsed; the caller no longer
    /// has exclusion and must not write.
    pub async fn extend(&self) -> AppResult<bool> {
        let extended = self.provider.extend(&self.key, &self.token, self.ttl).await?;
        if !extended {
            warn!(key = %self.key, "Lease lapsed before it could be extended");
        }
        Ok(extended)
    }

    /// Release the lease. Returns `false` if it had already lapsed.
    pub async fn release(mut self) -> AppResult<bool> {
        self.released = true;
        let released = self.provider.release(&self.key, &self.token).await?;
        debug!(key = %self.key, released, "Lease released");
        Ok(released)
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let provider = Arc::clone(&self.provider);
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = provider.release(&key, &token).await {
                        warn!(key = %key, error = %e, "Failed to release dropped lease");
                    }
                });
            }
            Err(_) => {
                warn!(key = %key, "No runtime to release dropped lease, leaving it to expire");
            }
        }
    }
}
