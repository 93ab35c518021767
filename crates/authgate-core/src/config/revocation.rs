//! Revocation cache configuration.

use serde::{Deserialize, Serialize};

/// Revocation cache settings.
///
/// `on_store_failure` has no default: a deployment must state whether an
/// unreachable cache blocks traffic or lets revoked credentials through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationConfig {
    /// Behaviour of blacklist lookups when the cache cannot be reached.
    pub on_store_failure: StoreFailureMode,
}

/// How a blacklist lookup answers when its backing store is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFailureMode {
    /// Report "not blacklisted" and let the request through.
    FailOpen,
    /// Report "blacklisted" and reject the request.
    FailClosed,
}

impl std::fmt::Display for StoreFailureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreFailureMode::FailOpen => write!(f, "fail_open"),
            StoreFailureMode::FailClosed => write!(f, "fail_closed"),
        }
    }
}
