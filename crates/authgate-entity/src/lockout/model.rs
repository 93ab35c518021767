//! Lockout record and result shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Per-principal failed-attempt counter.
///
/// A `lockout_until` in the past means "not locked", whether or not a
/// sweep has physically cleared it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LockoutRecord {
    /// Principal name.
    pub username: String,
    /// Consecutive failures since the last reset.
    pub failed_count: i32,
    /// End of the active lockout, if one was imposed.
    pub lockout_until: Option<DateTime<Utc>>,
    /// Last time the record changed.
    pub updated_at: DateTime<Utc>,
}

impl LockoutRecord {
    /// A clean record with no failures.
    pub fn clean(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            username: username.into(),
            failed_count: 0,
            lockout_until: None,
            updated_at: now,
        }
    }

    /// The lockout end if it is still in the future at `now`.
    pub fn active_lockout(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lockout_until.filter(|until| *until > now)
    }

    /// Whether the principal is locked out at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.active_lockout(now).is_some()
    }

    /// Whether a lockout was imposed and has since elapsed.
    pub fn lockout_elapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lockout_until, Some(until) if until <= now)
    }
}

/// Answer to "is this principal locked out right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutStatus {
    /// Whether logins are currently refused.
    pub is_locked_out: bool,
    /// When the lockout ends, if locked.
    pub lockout_until: Option<DateTime<Utc>>,
    /// Consecutive failures counted so far.
    pub failed_count: u32,
}

impl LockoutStatus {
    /// The status of a principal with no failures.
    pub fn unlocked() -> Self {
        Self {
            is_locked_out: false,
            lockout_until: None,
            failed_count: 0,
        }
    }
}

/// Result of recording a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLoginResult {
    /// Consecutive failures including this one.
    pub failed_count: u32,
    /// Whether the principal is now locked out.
    pub is_locked_out: bool,
    /// When the lockout ends, if locked.
    pub lockout_until: Option<DateTime<Utc>>,
}
