//! Issued credential entities.

pub mod kind;
pub mod model;

pub use kind::{CredentialKind, CredentialStatus};
pub use model::{CredentialRecord, DeviceInfo};
