//! Redis-based lease provider using Lua scripts for atomicity.
//!
//! Suitable for multi-node deployments.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use authgate_cache::redis::RedisClient;
use authgate_core::error::{AppError, ErrorKind};
use authgate_core::result::AppResult;
use authgate_core::traits::LeaseProvider;

/// Lua script releasing a lease only for its holder.
///
/// KEYS[1] = lease key
/// ARGV[1] = holder token
///
/// Returns 1 if deleted, 0 if the lease lapsed or changed hands.
const RELEASE_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('DEL', KEYS[1])
    end
    return 0
"#;

/// Lua script extending a lease only for its holder.
///
/// KEYS[1] = lease key
/// ARGV[1] = holder token
/// ARGV[2] = new TTL in milliseconds
///
/// Returns 1 if extended, 0 otherwise.
const EXTEND_SCRIPT: &str = r#"
    if redis.call('GET', KEYS[1]) == ARGV[1] then
        return redis.call('PEXPIRE', KEYS[1], ARGV[2])
    end
    return 0
"#;

/// Redis-based lease provider for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisLeaseProvider {
    /// Shared Redis client.
    client: RedisClient,
}

impl RedisLeaseProvider {
    /// Creates a lease provider over an existing Redis client.
    pub fn new(client: RedisClient) -> Self {
        info!("Redis lease provider initialized");
        Self { client }
    }

    /// Map a Redis error to an unavailable-store error.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(
            ErrorKind::StoreUnavailable,
            format!("Redis lease error: {e}"),
            e,
        )
    }

    fn ttl_millis(ttl: Duration) -> u64 {
        (ttl.as_millis() as u64).max(1)
    }
}

#[async_trait]
impl LeaseProvider for RedisLeaseProvider {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        // SET key token PX ttl NX
        let result: Option<String> = redis::cmd("SET")
            .arg(&full_key)
            .arg(token)
            .arg("PX")
            .arg(Self::ttl_millis(ttl))
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result.is_some())
    }

    async fn extend(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        let extended: i64 = redis::Script::new(EXTEND_SCRIPT)
            .key(&full_key)
            .arg(token)
            .arg(Self::ttl_millis(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(extended == 1)
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<bool> {
        let full_key = self.client.prefixed_key(key);
        let mut conn = self.client.conn_mut();

        let removed: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(&full_key)
            .arg(token)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if removed == 0 {
            debug!(key = %key, "Lease was no longer held at release");
        }
        Ok(removed > 0)
    }
}
