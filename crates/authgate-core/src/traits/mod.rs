//! Core traits defined in `authgate-core` and implemented by other crates.

pub mod cache;
pub mod clock;
pub mod lease;

pub use cache::CacheProvider;
pub use clock::{Clock, ManualClock, SystemClock};
pub use lease::LeaseProvider;
