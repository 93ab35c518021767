//! Cache key builders for all AuthGate cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

/// Prefix applied to all AuthGate cache keys.
const PREFIX: &str = "authgate";

// ── Revocation keys ────────────────────────────────────────

/// Marker for a single revoked credential, by reference id.
pub fn revoked_credential(reference_id: &str) -> String {
    format!("{PREFIX}:revoked:ref:{reference_id}")
}

/// Marker revoking every credential of a principal issued before an instant.
pub fn revoked_principal(subject: &str) -> String {
    format!("{PREFIX}:revoked:sub:{subject}")
}

/// Pattern matching every revocation marker.
pub fn revoked_pattern() -> String {
    format!("{PREFIX}:revoked:*")
}

// ── Lease keys ─────────────────────────────────────────────

/// Lease serializing login admission for one principal.
pub fn login_lease(subject: &str) -> String {
    format!("{PREFIX}:lease:login:{subject}")
}
