//! Device-based login admission policy configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest credential lifetime accepted from configuration (ten years).
pub const MAX_CREDENTIAL_LIFETIME_MINUTES: u64 = 10 * 365 * 24 * 60;

/// Settings governing how many concurrent device sessions a principal
/// may hold, plus the credential lifetimes consumed at minting time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginPolicySettings {
    /// Whether a principal may be logged in from more than one device.
    #[serde(default = "default_true")]
    pub allow_multiple_devices: bool,
    /// Maximum concurrent devices. A value of `0` means unlimited.
    #[serde(default)]
    pub max_devices: u32,
    /// What happens when a login from a new device hits a limit.
    #[serde(default)]
    pub new_device_policy: NewDevicePolicy,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token lifetime in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_hours: u64,
    /// Identity token lifetime in minutes.
    #[serde(default = "default_id_ttl")]
    pub id_token_ttl_minutes: u64,
}

impl LoginPolicySettings {
    /// Reject lifetimes that are zero or beyond
    /// [`MAX_CREDENTIAL_LIFETIME_MINUTES`].
    pub fn validate(&self) -> Result<(), AppError> {
        let lifetimes = [
            ("access_token_ttl_minutes", Some(self.access_token_ttl_minutes)),
            (
                "refresh_token_ttl_hours",
                self.refresh_token_ttl_hours.checked_mul(60),
            ),
            ("id_token_ttl_minutes", Some(self.id_token_ttl_minutes)),
        ];
        for (name, minutes) in lifetimes {
            match minutes {
                Some(m) if m > 0 && m <= MAX_CREDENTIAL_LIFETIME_MINUTES => {}
                _ => {
                    return Err(AppError::configuration(format!(
                        "login_policy.{name} must be positive and at most ten years"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> Duration {
        lifetime_minutes(self.access_token_ttl_minutes)
    }

    /// Refresh token lifetime.
    pub fn refresh_token_ttl(&self) -> Duration {
        lifetime_minutes(self.refresh_token_ttl_hours.saturating_mul(60))
    }

    /// Identity token lifetime.
    pub fn id_token_ttl(&self) -> Duration {
        lifetime_minutes(self.id_token_ttl_minutes)
    }

    /// The longest lifetime any credential can be minted with.
    ///
    /// Whole-principal revocation markers live this long, after which
    /// every credential they could have covered has expired on its own.
    pub fn max_credential_lifetime(&self) -> Duration {
        self.access_token_ttl()
            .max(self.refresh_token_ttl())
            .max(self.id_token_ttl())
    }
}

impl Default for LoginPolicySettings {
    fn default() -> Self {
        Self {
            allow_multiple_devices: true,
            max_devices: 0,
            new_device_policy: NewDevicePolicy::default(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_hours: default_refresh_ttl(),
            id_token_ttl_minutes: default_id_ttl(),
        }
    }
}

/// Policy applied when a login from a new device exceeds a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewDevicePolicy {
    /// Admit the login regardless of the device limits.
    Allow,
    /// Reject the new login.
    Deny,
    /// Revoke the oldest device session to make room.
    EvictOldest,
}

impl Default for NewDevicePolicy {
    fn default() -> Self {
        Self::Deny
    }
}

impl std::fmt::Display for NewDevicePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NewDevicePolicy::Allow => write!(f, "allow"),
            NewDevicePolicy::Deny => write!(f, "deny"),
            NewDevicePolicy::EvictOldest => write!(f, "evict_oldest"),
        }
    }
}

/// Minutes as a duration, capped at [`MAX_CREDENTIAL_LIFETIME_MINUTES`].
fn lifetime_minutes(minutes: u64) -> Duration {
    Duration::minutes(minutes.min(MAX_CREDENTIAL_LIFETIME_MINUTES) as i64)
}

fn default_true() -> bool {
    true
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    24
}

fn default_id_ttl() -> u64 {
    60
}
