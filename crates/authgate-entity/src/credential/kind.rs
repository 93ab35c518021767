//! Credential kind and status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of an issued credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credential_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Short-lived access token presented on every request.
    Access,
    /// Long-lived token exchanged for new access tokens.
    Refresh,
    /// Identity token describing the principal.
    Id,
}

impl CredentialKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Id => "id",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CredentialKind {
    type Err = authgate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "access" => Ok(Self::Access),
            "refresh" => Ok(Self::Refresh),
            "id" => Ok(Self::Id),
            _ => Err(authgate_core::AppError::validation(format!(
                "Invalid credential kind: '{s}'. Expected one of: access, refresh, id"
            ))),
        }
    }
}

/// Lifecycle status of a credential.
///
/// Transitions only ever leave `Valid`; a revoked or redeemed credential
/// never becomes valid again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credential_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    /// Issued and not yet revoked or redeemed.
    Valid,
    /// Revoked by logout, eviction, or an administrator.
    Revoked,
    /// Consumed by a one-time exchange.
    Redeemed,
}

impl CredentialStatus {
    /// Whether the status machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: CredentialStatus) -> bool {
        matches!(
            (self, next),
            (Self::Valid, Self::Revoked) | (Self::Valid, Self::Redeemed)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Revoked => "revoked",
            Self::Redeemed => "redeemed",
        }
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
