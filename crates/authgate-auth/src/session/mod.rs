//! Session directory: read projections over the token ledger.

pub mod device;
pub mod directory;

pub use device::{DeviceGroup, group_by_device};
pub use directory::SessionDirectory;
