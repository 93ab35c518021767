//! Failed-login lockout entities.

pub mod model;

pub use model::{FailedLoginResult, LockoutRecord, LockoutStatus};
