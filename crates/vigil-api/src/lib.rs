//! Vigil API Library
//!
//! HTTP handlers, authentication and application setup for the Vigil server.
//! The binary in `main.rs` only loads configuration and hands over to
//! [`setup::initialize_app`].

mod api_doc;
mod handlers;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

#[cfg(test)]
mod test_support;

pub use error::HttpAppError;
pub use state::AppState;
