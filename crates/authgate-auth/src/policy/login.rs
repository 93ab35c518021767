//! Input shapes for a login admission.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use authgate_entity::credential::{CredentialKind, CredentialRecord, DeviceInfo};

/// A credential minted by the issuer, awaiting admission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCredential {
    /// Access, refresh, or identity token.
    pub kind: CredentialKind,
    /// Presentable reference id chosen by the issuer.
    pub reference_id: String,
    /// Opaque reference to the minted payload.
    pub payload_ref: Option<String>,
    /// Issuing application.
    pub application_id: Option<String>,
    /// Authorization grant.
    pub authorization_id: Option<String>,
}

impl IssuedCredential {
    /// A credential with only its kind and reference id set.
    pub fn new(kind: CredentialKind, reference_id: impl Into<String>) -> Self {
        Self {
            kind,
            reference_id: reference_id.into(),
            payload_ref: None,
            application_id: None,
            authorization_id: None,
        }
    }

    /// Build the ledger record for this credential.
    pub(crate) fn to_record(
        &self,
        subject: &str,
        device: &DeviceInfo,
        created_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> CredentialRecord {
        let mut record = CredentialRecord::issue(
            subject,
            self.kind,
            self.reference_id.clone(),
            device.clone(),
            created_at,
            lifetime,
        );
        record.payload_ref = self.payload_ref.clone();
        record.application_id = self.application_id.clone();
        record.authorization_id = self.authorization_id.clone();
        record
    }
}

/// A successful credential check asking to become a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLogin {
    /// The principal logging in.
    pub subject: String,
    /// Device the login comes from.
    pub device: DeviceInfo,
    /// Credentials to record if admitted. The first is the session anchor.
    pub credentials: Vec<IssuedCredential>,
}

impl NewLogin {
    /// A login with no credentials attached yet.
    pub fn new(subject: impl Into<String>, device: DeviceInfo) -> Self {
        Self {
            subject: subject.into(),
            device,
            credentials: Vec::new(),
        }
    }

    /// Attach a minted credential.
    pub fn with_credential(mut self, kind: CredentialKind, reference_id: impl Into<String>) -> Self {
        self.credentials.push(IssuedCredential::new(kind, reference_id));
        self
    }
}
