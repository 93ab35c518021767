//! Revocation markers stored in the revocation cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A self-expiring revocation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RevocationMarker {
    /// A single credential, keyed by its reference id. Lives exactly as
    /// long as the credential would have.
    Credential {
        /// Reference id of the revoked credential.
        reference_id: String,
        /// Expiry mirrored from the credential.
        expires_at: DateTime<Utc>,
    },
    /// Every credential of a principal issued before `revoked_before`.
    /// Lives for the platform's maximum credential lifetime.
    Principal {
        /// The principal.
        subject: String,
        /// Credentials created strictly before this instant are revoked.
        revoked_before: DateTime<Utc>,
        /// When the marker itself lapses.
        expires_at: DateTime<Utc>,
    },
}

impl RevocationMarker {
    /// When the marker stops applying.
    pub fn expires_at(&self) -> DateTime<Utc> {
        match self {
            Self::Credential { expires_at, .. } | Self::Principal { expires_at, .. } => *expires_at,
        }
    }

    /// Whether the marker still applies at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// Whether a credential issued at `created_at` is covered by this
    /// principal marker. Credential markers never cover by time.
    pub fn covers_issued_at(&self, created_at: DateTime<Utc>) -> bool {
        match self {
            Self::Principal { revoked_before, .. } => created_at < *revoked_before,
            Self::Credential { .. } => false,
        }
    }
}
