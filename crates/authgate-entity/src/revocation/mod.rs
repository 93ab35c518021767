//! Revocation marker value objects.

pub mod marker;

pub use marker::RevocationMarker;
