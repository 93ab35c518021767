//! Login-admission lease configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Timing for the per-principal mutual-exclusion lease.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseConfig {
    /// How long a lease is held before it lapses on its own, in milliseconds.
    #[serde(default = "default_ttl")]
    pub ttl_ms: u64,
    /// How long an acquirer waits before failing with a lease timeout.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,
    /// Delay between acquisition attempts while waiting.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
}

impl LeaseConfig {
    /// Reject a zero TTL or retry interval, either of which would make
    /// acquisition spin.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.ttl_ms == 0 {
            return Err(AppError::configuration("lease.ttl_ms must be positive"));
        }
        if self.retry_interval_ms == 0 {
            return Err(AppError::configuration(
                "lease.retry_interval_ms must be positive",
            ));
        }
        Ok(())
    }

    /// Lease time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Maximum wait for acquisition.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Retry interval while waiting.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl(),
            wait_timeout_ms: default_wait_timeout(),
            retry_interval_ms: default_retry_interval(),
        }
    }
}

fn default_ttl() -> u64 {
    5_000
}

fn default_wait_timeout() -> u64 {
    3_000
}

fn default_retry_interval() -> u64 {
    25
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_retry_interval_is_rejected() {
        assert!(LeaseConfig::default().validate().is_ok());
        let spinning = LeaseConfig {
            retry_interval_ms: 0,
            ..LeaseConfig::default()
        };
        assert!(spinning.validate().is_err());
    }
}
