//! Vigil Infrastructure Library
//!
//! Shared infrastructure used by the service crates and the API binary:
//! - Telemetry initialization
//! - HTTP error response shape
//! - Job registry and scheduler for the background sweeps

pub mod error;
pub mod jobs;
pub mod telemetry;

pub use error::ErrorResponse;
pub use jobs::{JobDefinition, JobHandler, JobRegistry, JobRegistryError, JobScheduler, Schedule};
pub use telemetry::{init_telemetry, shutdown_telemetry};
