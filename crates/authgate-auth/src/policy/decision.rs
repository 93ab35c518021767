//! The device policy rule set, evaluated as one pure function.

use authgate_core::config::{LoginPolicySettings, NewDevicePolicy};

use crate::session::DeviceGroup;

/// What to do with a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Let the login in after revoking the listed device groups.
    Admit {
        /// The login comes from a device that already holds a session.
        refresh: bool,
        /// Keys of device groups to revoke first, oldest first.
        evict: Vec<String>,
    },
    /// Refuse the login.
    Reject {
        /// User-facing explanation.
        reason: String,
    },
}

impl Decision {
    fn admit() -> Self {
        Self::Admit {
            refresh: false,
            evict: Vec::new(),
        }
    }

    /// Whether the login would be let in.
    pub fn is_admit(&self) -> bool {
        matches!(self, Self::Admit { .. })
    }
}

/// Decide on a login from `device_id` given the principal's current
/// device groups, oldest first.
///
/// A login from a device that already holds a session is a refresh and
/// never evicts. Otherwise the single-device rule applies first, then the
/// numeric cap. `allow` admits over either limit.
pub fn decide(
    settings: &LoginPolicySettings,
    groups: &[DeviceGroup],
    device_id: Option<&str>,
) -> Decision {
    let same_device = device_id
        .map(|id| groups.iter().any(|g| g.device_id.as_deref() == Some(id)))
        .unwrap_or(false);
    if same_device {
        return Decision::Admit {
            refresh: true,
            evict: Vec::new(),
        };
    }

    if groups.is_empty() {
        return Decision::admit();
    }

    if !settings.allow_multiple_devices {
        return match settings.new_device_policy {
            NewDevicePolicy::Allow => Decision::admit(),
            NewDevicePolicy::Deny => Decision::Reject {
                reason: "Already signed in on another device. Sign out there first.".to_string(),
            },
            NewDevicePolicy::EvictOldest => Decision::Admit {
                refresh: false,
                evict: groups.iter().map(|g| g.key.clone()).collect(),
            },
        };
    }

    let max = settings.max_devices as usize;
    if max == 0 || groups.len() < max {
        return Decision::admit();
    }

    match settings.new_device_policy {
        NewDevicePolicy::Allow => Decision::admit(),
        NewDevicePolicy::Deny => Decision::Reject {
            reason: format!(
                "Maximum of {max} signed-in devices reached. Sign out of another device first."
            ),
        },
        NewDevicePolicy::EvictOldest => {
            // Normally one; more only if the cap was lowered under existing sessions.
            let surplus = groups.len() + 1 - max;
            Decision::Admit {
                refresh: false,
                evict: groups.iter().take(surplus).map(|g| g.key.clone()).collect(),
            }
        }
    }
}
