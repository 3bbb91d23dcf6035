//! Database repositories
//!
//! Each repository owns the SQL for one table. Operations that must change
//! several rows atomically (check-in, upload, expiration) run in a single
//! transaction inside the repository that owns the primary row.

pub mod check_in;
pub mod user;
pub mod video;

pub use check_in::CheckInRepository;
pub use user::{apply_storage_delta, try_reserve_storage, UserRepository};
pub use video::VideoRepository;
