//! Failed-login counting and temporary lockout.

pub mod guard;
pub mod memory;
pub mod postgres;
pub mod store;

pub use guard::LockoutGuard;
pub use memory::MemoryLockoutStore;
pub use postgres::PgLockoutStore;
pub use store::LockoutStore;
