//! Structured results of policy checks, admissions, and revocations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use authgate_entity::credential::CredentialRecord;

/// Uniform `(allowed, message)` answer of a policy check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCheck {
    /// Whether a login would be admitted now.
    pub allowed: bool,
    /// Explanation for the user, if any.
    pub message: Option<String>,
}

/// A login that passed the device policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    /// Id of the new session (the first recorded credential).
    pub session_id: Uuid,
    /// Records written to the ledger.
    pub credentials: Vec<CredentialRecord>,
    /// The device already held a session; nothing was evicted for it.
    pub refreshed: bool,
    /// Credentials revoked to make room.
    pub evicted: Vec<Uuid>,
}

/// Result of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionOutcome {
    /// The login became a session.
    Admitted(Admission),
    /// The device policy refused the login.
    Rejected {
        /// User-facing explanation.
        reason: String,
    },
}

impl AdmissionOutcome {
    /// The admission, if the login was let in.
    pub fn admitted(&self) -> Option<&Admission> {
        match self {
            Self::Admitted(admission) => Some(admission),
            Self::Rejected { .. } => None,
        }
    }
}

/// Count of credentials a revocation moved out of the valid state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationOutcome {
    /// Credentials affected.
    pub affected: u64,
}
