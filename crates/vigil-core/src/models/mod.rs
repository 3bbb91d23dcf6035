//! Data models for the application
//!
//! Each sub-module represents one domain area of the escrow lifecycle.

mod check_in;
mod job;
mod sweep;
mod user;
mod video;

pub use check_in::*;
pub use job::*;
pub use sweep::*;
pub use user::*;
pub use video::*;
