//! Grouping of valid credentials into device sessions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use authgate_entity::credential::CredentialRecord;

/// The valid credentials a principal holds on one device.
///
/// A login issues several credentials (access, refresh, id) that all count
/// as one device session. Credentials without a device id are grouped by
/// the login that issued them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGroup {
    /// Grouping key, see [`CredentialRecord::device_key`].
    pub key: String,
    /// Device identifier shared by the group, if any.
    pub device_id: Option<String>,
    /// Earliest creation instant in the group. Re-logins on the device add
    /// newer credentials without moving this.
    pub login_at: DateTime<Utc>,
    /// Lowest credential id among those created at `login_at`.
    pub anchor_id: Uuid,
    /// The group's credentials, oldest first.
    pub credentials: Vec<CredentialRecord>,
}

impl DeviceGroup {
    /// Ids of every credential in the group.
    pub fn credential_ids(&self) -> Vec<Uuid> {
        self.credentials.iter().map(|c| c.id).collect()
    }
}

/// Group credentials by device, ordered oldest device first (earliest
/// login instant, ties broken by lowest credential id).
pub fn group_by_device(mut records: Vec<CredentialRecord>) -> Vec<DeviceGroup> {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut groups: Vec<DeviceGroup> = Vec::new();
    for record in records {
        let key = record.device_key();
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.credentials.push(record),
            None => groups.push(DeviceGroup {
                key,
                device_id: record.device_id.clone(),
                login_at: record.created_at,
                anchor_id: record.id,
                credentials: vec![record],
            }),
        }
    }

    // Sorted input means groups were opened in (login_at, anchor_id) order.
    groups
}
