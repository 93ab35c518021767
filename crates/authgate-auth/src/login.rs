//! End-to-end login flow: lockout gate, credential outcome, admission.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use authgate_core::result::AppResult;

use crate::lockout::LockoutGuard;
use crate::policy::{Admission, AdmissionOutcome, LoginPolicyEnforcer, NewLogin};

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoginOutcome {
    /// The principal is locked out; credentials were not considered.
    LockedOut {
        /// When the lockout ends.
        lockout_until: Option<DateTime<Utc>>,
    },
    /// The credential check failed and was counted.
    InvalidCredentials {
        /// Consecutive failures including this one.
        failed_count: u32,
        /// Whether this failure triggered a lockout.
        is_locked_out: bool,
        /// When the lockout ends, if one is active.
        lockout_until: Option<DateTime<Utc>>,
    },
    /// Credentials were fine but the device policy refused the login.
    Rejected {
        /// User-facing explanation.
        reason: String,
    },
    /// The login became a session.
    Admitted(Admission),
}

/// Runs a login attempt through every guard in order.
#[derive(Debug, Clone)]
pub struct LoginCoordinator {
    /// Failed-attempt guard.
    lockout: Arc<LockoutGuard>,
    /// Device policy enforcer.
    enforcer: Arc<LoginPolicyEnforcer>,
}

impl LoginCoordinator {
    /// Creates a new coordinator.
    pub fn new(lockout: Arc<LockoutGuard>, enforcer: Arc<LoginPolicyEnforcer>) -> Self {
        Self { lockout, enforcer }
    }

    /// Process one attempt by `username`.
    ///
    /// `credentials_ok` is the issuer's verdict on the presented secret;
    /// `login` carries the credentials it minted for the success case.
    pub async fn attempt(
        &self,
        username: &str,
        credentials_ok: bool,
        login: NewLogin,
    ) -> AppResult<LoginOutcome> {
        let status = self.lockout.is_locked_out(username).await?;
        if status.is_locked_out {
            warn!(username = %username, "Login attempt while locked out");
            return Ok(LoginOutcome::LockedOut {
                lockout_until: status.lockout_until,
            });
        }

        if !credentials_ok {
            let failed = self.lockout.record_failed_login(username).await?;
            return Ok(LoginOutcome::InvalidCredentials {
                failed_count: failed.failed_count,
                is_locked_out: failed.is_locked_out,
                lockout_until: failed.lockout_until,
            });
        }

        self.lockout.reset_failed_count(username).await?;

        match self.enforcer.admit_login(login).await? {
            AdmissionOutcome::Admitted(admission) => {
                info!(
                    username = %username,
                    session_id = %admission.session_id,
                    "Login successful"
                );
                Ok(LoginOutcome::Admitted(admission))
            }
            AdmissionOutcome::Rejected { reason } => Ok(LoginOutcome::Rejected { reason }),
        }
    }
}
