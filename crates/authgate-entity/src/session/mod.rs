//! Session views derived from valid credentials.

pub mod model;

pub use model::Session;
