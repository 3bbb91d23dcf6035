//! Vigil Core Library
//!
//! Domain models, lifecycle rules, error types and configuration shared by every
//! Vigil crate. Nothing in here performs I/O except `Config::from_env`.

pub mod config;
pub mod constants;
pub mod error;
pub mod humanize;
pub mod lifecycle;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use lifecycle::can_perform_check_in;
