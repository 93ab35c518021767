//! Assembly of the engine's components over concrete stores.

use std::sync::Arc;

use tracing::{info, warn};

use authgate_cache::CacheManager;
use authgate_cache::memory::MemoryCacheProvider;
use authgate_core::config::cache::MemoryCacheConfig;
use authgate_core::config::{
    AppConfig, LeaseConfig, LockoutSettings, LoginPolicySettings, StoreFailureMode,
};
use authgate_core::result::AppResult;
use authgate_core::traits::{Clock, LeaseProvider, SystemClock};
use authgate_database::DatabasePool;
use authgate_database::repositories::credential::CredentialRepository;
use authgate_database::repositories::lockout::LockoutRepository;

use crate::lease::{LeaseManager, MemoryLeaseProvider};
use crate::ledger::{MemoryTokenLedger, PgTokenLedger, TokenLedger};
use crate::lockout::{LockoutGuard, LockoutStore, MemoryLockoutStore, PgLockoutStore};
use crate::login::LoginCoordinator;
use crate::policy::LoginPolicyEnforcer;
use crate::revocation::RevocationCache;
use crate::validator::CredentialValidator;

/// The settings the engine components read.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Device login policy.
    pub login_policy: LoginPolicySettings,
    /// Lockout thresholds.
    pub lockout: LockoutSettings,
    /// Admission lease timing.
    pub lease: LeaseConfig,
    /// Blacklist behaviour when the cache is unreachable.
    pub on_store_failure: StoreFailureMode,
}

impl EngineSettings {
    /// Defaults for everything except the store-failure mode, which has none.
    pub fn new(on_store_failure: StoreFailureMode) -> Self {
        Self {
            login_policy: LoginPolicySettings::default(),
            lockout: LockoutSettings::default(),
            lease: LeaseConfig::default(),
            on_store_failure,
        }
    }

    /// Extract the engine settings from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            login_policy: config.login_policy.clone(),
            lockout: config.lockout.clone(),
            lease: config.lease.clone(),
            on_store_failure: config.revocation.on_store_failure,
        }
    }
}

/// Every engine component, wired to one set of stores.
#[derive(Debug, Clone)]
pub struct AuthEngine {
    /// Credential ledger.
    pub ledger: Arc<dyn TokenLedger>,
    /// Revocation cache.
    pub revocation: Arc<RevocationCache>,
    /// Lockout guard.
    pub lockout: Arc<LockoutGuard>,
    /// Login policy enforcer.
    pub enforcer: Arc<LoginPolicyEnforcer>,
    /// Credential usability checks.
    pub validator: Arc<CredentialValidator>,
    /// End-to-end login flow.
    pub coordinator: Arc<LoginCoordinator>,
    /// Time source shared by all components.
    pub clock: Arc<dyn Clock>,
}

impl AuthEngine {
    /// Wire the engine to Postgres and the configured cache provider.
    ///
    /// The admission lease shares the cache's Redis connection when Redis
    /// is configured, and falls back to an in-process lease otherwise.
    pub async fn connect(config: &AppConfig, pool: &DatabasePool) -> AppResult<Self> {
        let cache = Arc::new(CacheManager::new(&config.cache).await?);
        let credentials = Arc::new(CredentialRepository::new(pool.pool().clone()));
        let lockouts = Arc::new(LockoutRepository::new(pool.pool().clone()));

        let engine = Self::assemble(
            Arc::new(PgTokenLedger::new(credentials)),
            Arc::new(PgLockoutStore::new(lockouts)),
            Arc::clone(&cache),
            lease_provider(&cache),
            EngineSettings::from_config(config),
            Arc::new(SystemClock),
        );

        info!(
            cache = %config.cache.provider,
            new_device_policy = %config.login_policy.new_device_policy,
            on_store_failure = %config.revocation.on_store_failure,
            "Auth engine initialized"
        );
        Ok(engine)
    }

    /// Wire the engine to in-process stores only.
    pub fn in_memory(settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        let cache = MemoryCacheProvider::new(&MemoryCacheConfig::default());
        Self::assemble(
            Arc::new(MemoryTokenLedger::new()),
            Arc::new(MemoryLockoutStore::new()),
            Arc::new(CacheManager::from_provider(Arc::new(cache))),
            Arc::new(MemoryLeaseProvider::new()),
            settings,
            clock,
        )
    }

    /// Wire the engine from explicit store instances.
    pub fn assemble(
        ledger: Arc<dyn TokenLedger>,
        lockout_store: Arc<dyn LockoutStore>,
        cache: Arc<CacheManager>,
        leases: Arc<dyn LeaseProvider>,
        settings: EngineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let revocation = Arc::new(RevocationCache::new(
            cache,
            Arc::clone(&clock),
            settings.on_store_failure,
            settings.login_policy.max_credential_lifetime(),
        ));
        let lockout = Arc::new(LockoutGuard::new(
            lockout_store,
            settings.lockout,
            Arc::clone(&clock),
        ));
        let enforcer = Arc::new(LoginPolicyEnforcer::new(
            Arc::clone(&ledger),
            Arc::clone(&revocation),
            Arc::new(LeaseManager::new(leases, settings.lease)),
            settings.login_policy,
            Arc::clone(&clock),
        ));
        let validator = Arc::new(CredentialValidator::new(
            Arc::clone(&revocation),
            Arc::clone(&clock),
        ));
        let coordinator = Arc::new(LoginCoordinator::new(
            Arc::clone(&lockout),
            Arc::clone(&enforcer),
        ));

        Self {
            ledger,
            revocation,
            lockout,
            enforcer,
            validator,
            coordinator,
            clock,
        }
    }
}

/// Pick the lease backend matching the cache deployment.
fn lease_provider(cache: &CacheManager) -> Arc<dyn LeaseProvider> {
    #[cfg(feature = "redis-lease")]
    if let Some(client) = cache.redis_client() {
        return Arc::new(crate::lease::RedisLeaseProvider::new(client.clone()));
    }
    #[cfg(not(feature = "redis-lease"))]
    let _ = cache;

    warn!("No shared lease backend; admission is serialized within this process only");
    Arc::new(MemoryLeaseProvider::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::NewLogin;
    use authgate_core::traits::ManualClock;
    use authgate_entity::credential::{CredentialKind, DeviceInfo};
    use chrono::Utc;

    #[tokio::test]
    async fn test_components_share_stores() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = AuthEngine::in_memory(
            EngineSettings::new(StoreFailureMode::FailClosed),
            clock.clone(),
        );

        let login = NewLogin::new("alice", DeviceInfo::with_id("phone"))
            .with_credential(CredentialKind::Access, "a-1");
        let outcome = engine.coordinator.attempt("alice", true, login).await.unwrap();
        assert!(matches!(outcome, crate::LoginOutcome::Admitted(_)));

        let record = engine
            .ledger
            .find_by_reference_id("a-1")
            .await
            .unwrap()
            .unwrap();
        assert!(engine.validator.validate(&record).await.unwrap().is_usable());

        engine.enforcer.revoke_token(record.id).await.unwrap();
        assert!(engine.revocation.is_blacklisted("a-1").await.unwrap());
    }
}
