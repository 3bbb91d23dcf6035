//! Vigil Database Layer
//!
//! PostgreSQL repositories for videos, check-ins and user storage counters,
//! plus the store traits the services and sweeps are written against.

pub mod db;
pub mod store_traits;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{CheckInRepository, UserRepository, VideoRepository};
pub use store_traits::{CheckInStore, UserStore, VideoStore};
