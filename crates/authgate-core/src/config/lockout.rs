//! Account lockout configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest lockout accepted from configuration (one year).
pub const MAX_LOCKOUT_MINUTES: u64 = 365 * 24 * 60;

/// Failed-login lockout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutSettings {
    /// Whether lockout is enforced at all. When disabled every guard
    /// operation reports "not locked".
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Consecutive failures that trigger a lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: u32,
    /// Lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
}

impl LockoutSettings {
    /// Reject settings that would never lock or would overflow.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.enabled {
            return Ok(());
        }
        if self.max_failed_attempts == 0 {
            return Err(AppError::configuration(
                "lockout.max_failed_attempts must be at least 1 when lockout is enabled",
            ));
        }
        if self.lockout_duration_minutes == 0 || self.lockout_duration_minutes > MAX_LOCKOUT_MINUTES
        {
            return Err(AppError::configuration(
                "lockout.lockout_duration_minutes must be positive and at most one year",
            ));
        }
        Ok(())
    }

    /// The lockout window as a chrono duration, capped at
    /// [`MAX_LOCKOUT_MINUTES`].
    pub fn lockout_duration(&self) -> Duration {
        Duration::minutes(self.lockout_duration_minutes.min(MAX_LOCKOUT_MINUTES) as i64)
    }
}

impl Default for LockoutSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_failed() -> u32 {
    5
}

fn default_lockout() -> u64 {
    15
}
