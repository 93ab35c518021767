//! Periodic sweep of expired credentials, elapsed lockouts, and stale
//! revocation markers.

use std::sync::Arc;

use serde::Serialize;

use authgate_auth::ledger::TokenLedger;
use authgate_auth::{LockoutGuard, RevocationCache};
use authgate_core::traits::Clock;

/// What one sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Ledger records past their expiry that were deleted.
    pub expired_credentials: u64,
    /// Lockout records whose lockout had elapsed.
    pub elapsed_lockouts: u64,
    /// Whether the revocation cache housekeeping ran cleanly.
    pub revocation_cleaned: bool,
    /// Steps that failed; the remaining steps still ran.
    pub failed_steps: Vec<String>,
}

impl SweepReport {
    /// Whether every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed_steps.is_empty()
    }
}

/// Runs the maintenance steps against the live stores.
#[derive(Debug, Clone)]
pub struct MaintenanceJob {
    /// Credential ledger.
    ledger: Arc<dyn TokenLedger>,
    /// Lockout guard.
    lockout: Arc<LockoutGuard>,
    /// Revocation cache.
    revocation: Arc<RevocationCache>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl MaintenanceJob {
    /// Create a new maintenance job
    pub fn new(
        ledger: Arc<dyn TokenLedger>,
        lockout: Arc<LockoutGuard>,
        revocation: Arc<RevocationCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            lockout,
            revocation,
            clock,
        }
    }

    /// Run every step once. A failing step is logged and recorded in the
    /// report without stopping the others.
    pub async fn run(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.ledger.sweep_expired(self.clock.now()).await {
            Ok(removed) => report.expired_credentials = removed,
            Err(e) => {
                tracing::error!("Credential sweep failed: {}", e);
                report.failed_steps.push("credentials".to_string());
            }
        }

        match self.lockout.sweep().await {
            Ok(removed) => report.elapsed_lockouts = removed,
            Err(e) => {
                tracing::error!("Lockout sweep failed: {}", e);
                report.failed_steps.push("lockouts".to_string());
            }
        }

        match self.revocation.cleanup_expired().await {
            Ok(()) => report.revocation_cleaned = true,
            Err(e) => {
                tracing::error!("Revocation cache cleanup failed: {}", e);
                report.failed_steps.push("revocation".to_string());
            }
        }

        tracing::info!(
            expired_credentials = report.expired_credentials,
            elapsed_lockouts = report.elapsed_lockouts,
            failed_steps = report.failed_steps.len(),
            "Maintenance sweep complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_auth::ledger::MemoryTokenLedger;
    use authgate_auth::lockout::MemoryLockoutStore;
    use authgate_cache::CacheManager;
    use authgate_cache::memory::MemoryCacheProvider;
    use authgate_core::config::cache::MemoryCacheConfig;
    use authgate_core::config::{LockoutSettings, StoreFailureMode};
    use authgate_core::traits::ManualClock;
    use authgate_entity::credential::{CredentialKind, CredentialRecord, DeviceInfo};
    use chrono::{Duration, Utc};

    struct Fixture {
        clock: Arc<ManualClock>,
        ledger: Arc<MemoryTokenLedger>,
        lockout: Arc<LockoutGuard>,
        job: MaintenanceJob,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let ledger = Arc::new(MemoryTokenLedger::new());
        let lockout = Arc::new(LockoutGuard::new(
            Arc::new(MemoryLockoutStore::new()),
            LockoutSettings::default(),
            clock.clone(),
        ));
        let cache = MemoryCacheProvider::new(&MemoryCacheConfig::default());
        let revocation = Arc::new(RevocationCache::new(
            Arc::new(CacheManager::from_provider(Arc::new(cache))),
            clock.clone(),
            StoreFailureMode::FailClosed,
            Duration::days(30),
        ));
        let job = MaintenanceJob::new(ledger.clone(), lockout.clone(), revocation, clock.clone());
        Fixture {
            clock,
            ledger,
            lockout,
            job,
        }
    }

    #[tokio::test]
    async fn test_sweeps_only_what_has_lapsed() {
        let f = fixture();
        let now = f.clock.now();
        for (reference, minutes) in [("short", 5), ("long", 60)] {
            let record = CredentialRecord::issue(
                "alice",
                CredentialKind::Access,
                reference,
                DeviceInfo::with_id("phone"),
                now,
                Duration::minutes(minutes),
            );
            f.ledger.record(&record).await.unwrap();
        }
        for _ in 0..5 {
            f.lockout.record_failed_login("bob").await.unwrap();
        }

        let report = f.job.run().await;
        assert_eq!(report.expired_credentials, 0);
        assert_eq!(report.elapsed_lockouts, 0);
        assert!(report.is_clean());

        f.clock.advance(Duration::minutes(20));
        let report = f.job.run().await;
        assert_eq!(report.expired_credentials, 1);
        assert_eq!(report.elapsed_lockouts, 1);
        assert!(report.revocation_cleaned);
        assert_eq!(f.ledger.len().await, 1);
        assert!(f.ledger.find_by_reference_id("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_stores_sweep_cleanly() {
        let report = fixture().job.run().await;
        assert_eq!(
            report,
            SweepReport {
                revocation_cleaned: true,
                ..SweepReport::default()
            }
        );
    }
}
