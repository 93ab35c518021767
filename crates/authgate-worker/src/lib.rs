//! Background maintenance for AuthGate.
//!
//! This crate provides:
//! - A maintenance job that sweeps expired credentials, elapsed lockouts,
//!   and stale revocation markers
//! - A cron scheduler that runs the job periodically inside the daemon

pub mod jobs;
pub mod scheduler;

pub use jobs::maintenance::{MaintenanceJob, SweepReport};
pub use scheduler::MaintenanceScheduler;
