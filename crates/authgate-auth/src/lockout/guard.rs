//! Lockout guard: Clean → Accumulating → Locked → Clean.

use std::sync::Arc;

use tracing::{debug, info, warn};

use authgate_core::config::LockoutSettings;
use authgate_core::result::AppResult;
use authgate_core::traits::Clock;
use authgate_entity::lockout::{FailedLoginResult, LockoutRecord, LockoutStatus};

use super::store::LockoutStore;

/// Per-principal failed-attempt guard.
///
/// An elapsed `lockout_until` counts as unlocked the moment it passes; no
/// sweep has to run first. When lockout is disabled every operation is a
/// no-op that reports "not locked".
#[derive(Debug, Clone)]
pub struct LockoutGuard {
    /// Counter storage.
    store: Arc<dyn LockoutStore>,
    /// Lockout settings.
    settings: LockoutSettings,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl LockoutGuard {
    /// Creates a new lockout guard.
    pub fn new(
        store: Arc<dyn LockoutStore>,
        settings: LockoutSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
        }
    }

    /// A snapshot of the active settings.
    pub fn settings(&self) -> LockoutSettings {
        self.settings.clone()
    }

    /// Whether `username` is locked out right now.
    pub async fn is_locked_out(&self, username: &str) -> AppResult<LockoutStatus> {
        if !self.settings.enabled {
            return Ok(LockoutStatus::unlocked());
        }

        let now = self.clock.now();
        let status = match self.store.get(username).await? {
            Some(record) => {
                let lockout_until = record.active_lockout(now);
                // An elapsed lockout reports a clean slate even before the
                // next failure or sweep resets the stored count.
                let failed_count = if record.lockout_elapsed(now) {
                    0
                } else {
                    record.failed_count.max(0) as u32
                };
                LockoutStatus {
                    is_locked_out: lockout_until.is_some(),
                    lockout_until,
                    failed_count,
                }
            }
            None => LockoutStatus::unlocked(),
        };

        debug!(
            username = %username,
            locked = status.is_locked_out,
            "Checked lockout status"
        );
        Ok(status)
    }

    /// Count a failed credential check.
    ///
    /// Crossing the threshold sets `lockout_until` once; further failures
    /// while locked do not push it out.
    pub async fn record_failed_login(&self, username: &str) -> AppResult<FailedLoginResult> {
        if !self.settings.enabled {
            return Ok(FailedLoginResult {
                failed_count: 0,
                is_locked_out: false,
                lockout_until: None,
            });
        }

        let now = self.clock.now();
        let record = self.store.increment(username, now).await?;
        let failed_count = record.failed_count.max(0) as u32;

        if let Some(until) = record.active_lockout(now) {
            return Ok(FailedLoginResult {
                failed_count,
                is_locked_out: true,
                lockout_until: Some(until),
            });
        }

        if failed_count < self.settings.max_failed_attempts {
            debug!(username = %username, failed_count, "Failed login recorded");
            return Ok(FailedLoginResult {
                failed_count,
                is_locked_out: false,
                lockout_until: None,
            });
        }

        let until = now + self.settings.lockout_duration();
        let lockout_until = self
            .store
            .lock_until(username, until, now)
            .await?
            .and_then(|r| r.active_lockout(now));

        if let Some(until) = lockout_until {
            warn!(
                username = %username,
                attempts = failed_count,
                locked_until = %until,
                "Principal locked out after repeated failed logins"
            );
        }

        Ok(FailedLoginResult {
            failed_count,
            is_locked_out: lockout_until.is_some(),
            lockout_until,
        })
    }

    /// Clear the counter and any lockout after a successful credential check.
    pub async fn reset_failed_count(&self, username: &str) -> AppResult<()> {
        if !self.settings.enabled {
            return Ok(());
        }
        if self.store.clear(username).await? {
            debug!(username = %username, "Failed login count reset");
        }
        Ok(())
    }

    /// Administrative unlock. Returns whether there was anything to clear.
    pub async fn unlock_user(&self, username: &str) -> AppResult<bool> {
        if !self.settings.enabled {
            return Ok(false);
        }
        let cleared = self.store.clear(username).await?;
        if cleared {
            info!(username = %username, "Principal unlocked by administrator");
        }
        Ok(cleared)
    }

    /// Drop records whose lockout has elapsed.
    pub async fn sweep(&self) -> AppResult<u64> {
        self.store.sweep_elapsed(self.clock.now()).await
    }

    /// Principals currently locked out, soonest release first.
    pub async fn locked_principals(&self) -> AppResult<Vec<LockoutRecord>> {
        if !self.settings.enabled {
            return Ok(Vec::new());
        }
        self.store.list_locked(self.clock.now()).await
    }
}
