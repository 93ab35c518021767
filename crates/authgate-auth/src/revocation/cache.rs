//! Self-expiring revocation markers consulted on every authenticated request.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use authgate_cache::keys;
use authgate_cache::provider::CacheManager;
use authgate_core::config::StoreFailureMode;
use authgate_core::error::AppError;
use authgate_core::result::AppResult;
use authgate_core::traits::{CacheProvider, Clock};
use authgate_entity::revocation::RevocationMarker;

/// Blacklist of revoked credentials and principals.
///
/// Reads take no lock and tolerate staleness. Every marker carries its own
/// expiry, so correctness never depends on `cleanup_expired` running.
#[derive(Clone)]
pub struct RevocationCache {
    /// Cache manager holding the markers.
    cache: Arc<CacheManager>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Answer given by lookups when the cache is unreachable.
    on_store_failure: StoreFailureMode,
    /// Lifetime of whole-principal markers.
    principal_marker_ttl: Duration,
}

impl std::fmt::Debug for RevocationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationCache")
            .field("on_store_failure", &self.on_store_failure)
            .field("principal_marker_ttl", &self.principal_marker_ttl)
            .finish()
    }
}

impl RevocationCache {
    /// Creates a new revocation cache.
    ///
    /// `principal_marker_ttl` must be the longest lifetime any credential
    /// can be minted with.
    pub fn new(
        cache: Arc<CacheManager>,
        clock: Arc<dyn Clock>,
        on_store_failure: StoreFailureMode,
        principal_marker_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            clock,
            on_store_failure,
            principal_marker_ttl,
        }
    }

    /// The configured store-failure mode.
    pub fn on_store_failure(&self) -> StoreFailureMode {
        self.on_store_failure
    }

    /// Blacklist a single credential until its own expiry.
    ///
    /// A credential that has already expired needs no marker.
    pub async fn blacklist(&self, reference_id: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        let now = self.clock.now();
        let Some(ttl) = remaining(expires_at, now) else {
            debug!(reference_id = %reference_id, "Credential already expired, no marker needed");
            return Ok(());
        };

        let marker = RevocationMarker::Credential {
            reference_id: reference_id.to_string(),
            expires_at,
        };
        self.cache
            .set_json(&keys::revoked_credential(reference_id), &marker, ttl)
            .await?;

        debug!(
            reference_id = %reference_id,
            expires_at = %expires_at,
            "Credential blacklisted"
        );
        Ok(())
    }

    /// Whether a credential reference id is blacklisted.
    pub async fn is_blacklisted(&self, reference_id: &str) -> AppResult<bool> {
        let key = keys::revoked_credential(reference_id);
        match self.cache.get_json::<RevocationMarker>(&key).await {
            Ok(marker) => Ok(marker.is_some_and(|m| m.is_active(self.clock.now()))),
            Err(e) if e.is_store_failure() => Ok(self.degraded_lookup(&e, "credential")),
            Err(e) => Err(e),
        }
    }

    /// Revoke every credential of `subject` created before `as_of`.
    ///
    /// A single marker is written regardless of how many sessions the
    /// principal holds. An existing marker with a later cutoff is kept.
    pub async fn blacklist_principal(
        &self,
        subject: &str,
        as_of: DateTime<Utc>,
    ) -> AppResult<()> {
        let key = keys::revoked_principal(subject);
        let now = self.clock.now();

        if let Some(RevocationMarker::Principal { revoked_before, .. }) =
            self.cache.get_json::<RevocationMarker>(&key).await?
        {
            if revoked_before >= as_of {
                debug!(subject = %subject, "Later principal marker already present");
                return Ok(());
            }
        }

        let expires_at = as_of + self.principal_marker_ttl;
        let Some(ttl) = remaining(expires_at, now) else {
            return Ok(());
        };

        let marker = RevocationMarker::Principal {
            subject: subject.to_string(),
            revoked_before: as_of,
            expires_at,
        };
        self.cache.set_json(&key, &marker, ttl).await?;

        info!(subject = %subject, revoked_before = %as_of, "Principal blacklisted");
        Ok(())
    }

    /// The revoke-everything-before instant for `subject`, if any.
    pub async fn is_principal_blacklisted(
        &self,
        subject: &str,
    ) -> AppResult<Option<DateTime<Utc>>> {
        let key = keys::revoked_principal(subject);
        let now = self.clock.now();
        match self.cache.get_json::<RevocationMarker>(&key).await {
            Ok(Some(RevocationMarker::Principal {
                revoked_before,
                expires_at,
                ..
            })) if now < expires_at => Ok(Some(revoked_before)),
            Ok(_) => Ok(None),
            Err(e) if e.is_store_failure() => {
                // Failing closed treats every credential issued so far as revoked.
                Ok(self.degraded_lookup(&e, "principal").then_some(now))
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort housekeeping; markers expire on their own regardless.
    pub async fn cleanup_expired(&self) -> AppResult<()> {
        self.cache.run_maintenance().await
    }

    /// Resolve a lookup against an unreachable store per the configured mode.
    fn degraded_lookup(&self, error: &AppError, scope: &str) -> bool {
        let revoked = self.on_store_failure == StoreFailureMode::FailClosed;
        warn!(
            scope,
            mode = %self.on_store_failure,
            error = %error,
            "Revocation store unavailable, answering from configured failure mode"
        );
        revoked
    }
}

/// Time left until `expires_at`, or `None` if it has passed.
fn remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<std::time::Duration> {
    (expires_at - now).to_std().ok().filter(|d| !d.is_zero())
}
