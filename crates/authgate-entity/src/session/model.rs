//! Session view model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::CredentialRecord;

/// A login session as shown to the principal or an administrator.
///
/// Sessions are not stored. One is derived for every valid credential and
/// disappears when that credential leaves the valid state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (the credential id).
    pub session_id: Uuid,
    /// Login the credential was issued by. Credentials of one login share it.
    pub login_id: Uuid,
    /// Device identifier.
    pub device_id: Option<String>,
    /// Device class.
    pub device_kind: Option<String>,
    /// Device name.
    pub device_name: Option<String>,
    /// Origin network address.
    pub origin_address: Option<String>,
    /// When the credential was issued.
    pub login_at: DateTime<Utc>,
    /// Last observed activity, or the login instant if never touched.
    pub last_active_at: DateTime<Utc>,
    /// When the session ends on its own.
    pub expires_at: DateTime<Utc>,
    /// Whether this is the caller's own session.
    pub is_current: bool,
}

impl Session {
    /// Project a credential into a session view.
    pub fn from_credential(record: &CredentialRecord, current: Option<Uuid>) -> Self {
        Self {
            session_id: record.id,
            login_id: record.login_id,
            device_id: record.device_id.clone(),
            device_kind: record.device_kind.clone(),
            device_name: record.device_name.clone(),
            origin_address: record.origin_address.clone(),
            login_at: record.created_at,
            last_active_at: record.last_active_at.unwrap_or(record.created_at),
            expires_at: record.expires_at,
            is_current: current == Some(record.id),
        }
    }
}
