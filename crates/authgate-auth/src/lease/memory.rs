//! In-memory lease provider for single-node deployments.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;

use authgate_core::result::AppResult;
use authgate_core::traits::LeaseProvider;

/// A granted lease.
#[derive(Debug, Clone)]
struct Holder {
    token: String,
    expires_at: Instant,
}

impl Holder {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Leases held in a concurrent map. Expiry is evaluated lazily on access.
///
/// Only serializes callers inside this process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaseProvider {
    leases: Arc<DashMap<String, Holder>>,
}

impl MemoryLeaseProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaseProvider for MemoryLeaseProvider {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        let holder = Holder {
            token: token.to_string(),
            expires_at: now + ttl,
        };

        match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_live(now) {
                    return Ok(false);
                }
                entry.insert(holder);
                Ok(true)
            }
            Entry::Vacant(entry) => {
                entry.insert(holder);
                Ok(true)
            }
        }
    }

    async fn extend(&self, key: &str, token: &str, ttl: Duration) -> AppResult<bool> {
        let now = Instant::now();
        match self.leases.get_mut(key) {
            Some(mut holder) if holder.token == token && holder.is_live(now) => {
                holder.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, key: &str, token: &str) -> AppResult<bool> {
        let now = Instant::now();
        Ok(self
            .leases
            .remove_if(key, |_, holder| holder.token == token && holder.is_live(now))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exclusive_until_released() {
        let leases = MemoryLeaseProvider::new();
        let ttl = Duration::from_secs(5);

        assert!(leases.try_acquire("k", "a", ttl).await.unwrap());
        assert!(!leases.try_acquire("k", "b", ttl).await.unwrap());
        assert!(!leases.release("k", "b").await.unwrap());
        assert!(leases.release("k", "a").await.unwrap());
        assert!(leases.try_acquire("k", "b", ttl).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_lease_is_free_and_fenced() {
        let leases = MemoryLeaseProvider::new();
        let ttl = Duration::from_millis(100);

        assert!(leases.try_acquire("k", "a", ttl).await.unwrap());
        tokio::time::advance(Duration::from_millis(150)).await;

        assert!(!leases.extend("k", "a", ttl).await.unwrap());
        assert!(leases.try_acquire("k", "b", ttl).await.unwrap());
        // The stale holder cannot release the new holder's lease.
        assert!(!leases.release("k", "a").await.unwrap());
        assert!(leases.extend("k", "b", ttl).await.unwrap());
    }
}
