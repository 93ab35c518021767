//! Revocation cache (blacklist guard).

pub mod cache;

pub use cache::RevocationCache;
