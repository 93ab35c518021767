//! Job implementations.

pub mod maintenance;
