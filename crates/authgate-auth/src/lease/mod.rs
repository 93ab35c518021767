//! Time-bounded, token-fenced mutual exclusion across instances.
//!
//! Provides lease backends using either:
//! - Redis `SET NX PX` plus Lua compare-and-delete (multi-node deployments)
//! - An in-process concurrent map (single-node deployments and tests)

pub mod manager;
pub mod memory;
#[cfg(feature = "redis-lease")]
pub mod redis;

pub use manager::{LeaseGuard, LeaseManager};
pub use memory::MemoryLeaseProvider;
#[cfg(feature = "redis-lease")]
pub use redis::RedisLeaseProvider;
