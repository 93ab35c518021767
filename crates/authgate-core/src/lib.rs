//! # authgate-core
//!
//! Core crate for AuthGate. Contains the unified error system, the
//! configuration schemas, and the store traits (cache, lease, clock)
//! that the backend crates implement.
//!
//! This crate has **no** internal dependencies on other AuthGate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
