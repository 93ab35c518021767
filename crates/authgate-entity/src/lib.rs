//! # authgate-entity
//!
//! Domain entity models for AuthGate. Credential records and lockout
//! records map to database rows and derive `sqlx::FromRow`; sessions and
//! revocation markers are value objects derived from or stored beside them.

pub mod credential;
pub mod lockout;
pub mod revocation;
pub mod session;
