//! Lifecycle sweeps
//!
//! Each sweep is an idempotent batch over the rows that are due at a reference
//! time. Failing to enumerate the batch is an error for the whole run; a
//! failure on one row is recorded in the result and the row is left for the
//! next run.

mod distribution;
mod expiration;
mod notification;

pub use distribution::DistributionSweep;
pub use expiration::ExpirationSweep;
pub use notification::{reminder_body, NotificationSweep, REMINDER_TITLE};
