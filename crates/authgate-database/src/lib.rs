//! # authgate-database
//!
//! PostgreSQL connection management and concrete repositories for the
//! credential ledger and the lockout counters.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
