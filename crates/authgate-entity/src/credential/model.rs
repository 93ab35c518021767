//! Credential record entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{CredentialKind, CredentialStatus};

/// A credential issued to a principal and tracked by the token ledger.
///
/// The ledger is the source of truth for status, expiry, and ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CredentialRecord {
    /// Internal storage identifier. Also the session id of a login credential.
    pub id: Uuid,
    /// Shared by every credential one login issued. Equal to the id of the
    /// login's first credential.
    pub login_id: Uuid,
    /// The principal the credential was issued to.
    pub subject: String,
    /// Issuing application, if any.
    pub application_id: Option<String>,
    /// Authorization grant the credential belongs to, if any.
    pub authorization_id: Option<String>,
    /// Access, refresh, or identity token.
    pub kind: CredentialKind,
    /// Lifecycle status.
    pub status: CredentialStatus,
    /// Opaque reference to the minted payload.
    pub payload_ref: Option<String>,
    /// Externally presentable identifier used for revocation lookups.
    pub reference_id: String,
    /// When the credential stops being usable.
    pub expires_at: DateTime<Utc>,
    /// When the credential was issued.
    pub created_at: DateTime<Utc>,
    /// Last time the credential was seen on a request.
    pub last_active_at: Option<DateTime<Utc>>,

    // -- Device --
    /// Stable device identifier supplied at login.
    pub device_id: Option<String>,
    /// Device class (e.g. "browser", "mobile").
    pub device_kind: Option<String>,
    /// Human-readable device name.
    pub device_name: Option<String>,
    /// Network address the login came from.
    pub origin_address: Option<String>,
}

/// Device details captured at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable device identifier.
    pub device_id: Option<String>,
    /// Device class.
    pub device_kind: Option<String>,
    /// Human-readable device name.
    pub device_name: Option<String>,
    /// Origin network address.
    pub origin_address: Option<String>,
}

impl DeviceInfo {
    /// Device info carrying only an identifier.
    pub fn with_id(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            ..Self::default()
        }
    }
}

impl CredentialRecord {
    /// Build a freshly issued, valid credential.
    pub fn issue(
        subject: impl Into<String>,
        kind: CredentialKind,
        reference_id: impl Into<String>,
        device: DeviceInfo,
        created_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            login_id: id,
            subject: subject.into(),
            application_id: None,
            authorization_id: None,
            kind,
            status: CredentialStatus::Valid,
            payload_ref: None,
            reference_id: reference_id.into(),
            expires_at: created_at + lifetime,
            created_at,
            last_active_at: None,
            device_id: device.device_id,
            device_kind: device.device_kind,
            device_name: device.device_name,
            origin_address: device.origin_address,
        }
    }

    /// Whether the credential is valid and unexpired at `now`.
    ///
    /// This covers the ledger half of usability; revocation markers are
    /// checked separately by the validator.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == CredentialStatus::Valid && now < self.expires_at
    }

    /// Whether the credential has passed its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Attach the credential to the login that issued it.
    pub fn in_login(mut self, login_id: Uuid) -> Self {
        self.login_id = login_id;
        self
    }

    /// Key grouping this credential into a device session.
    ///
    /// Credentials without a device id are grouped by the login that
    /// issued them.
    pub fn device_key(&self) -> String {
        match &self.device_id {
            Some(device_id) => format!("device:{device_id}"),
            None => format!("login:{}", self.login_id),
        }
    }

    /// Whether the credential was issued on the given device.
    pub fn is_on_device(&self, device_id: &str) -> bool {
        self.device_id.as_deref() == Some(device_id)
    }

    /// The device details stored on the credential.
    pub fn device(&self) -> DeviceInfo {
        DeviceInfo {
            device_id: self.device_id.clone(),
            device_kind: self.device_kind.clone(),
            device_name: self.device_name.clone(),
            origin_address: self.origin_address.clone(),
        }
    }

    /// Seconds until expiry, never negative.
    pub fn remaining_ttl_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }
}
