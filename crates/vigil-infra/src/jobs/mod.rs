//! Background job registry and scheduler
//!
//! Jobs are registered once at startup under a [`JobName`](vigil_core::models::JobName)
//! and then driven by [`JobScheduler`], one tokio task per job. A job never
//! overlaps itself: the next firing is only computed after the previous run
//! has returned.

mod registry;
mod schedule;
mod scheduler;

pub use registry::{JobDefinition, JobHandler, JobRegistry, JobRegistryError};
pub use schedule::Schedule;
pub use scheduler::JobScheduler;
