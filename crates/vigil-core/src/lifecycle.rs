//! Video lifecycle rules.
//!
//! Status only advances `PENDING -> ACTIVE -> DISTRIBUTED -> EXPIRED`; the
//! persistence layer enforces that with status predicates on every update.
//! Deadlines are computed from day counts that `Config::validate` bounds by
//! `MAX_CONFIGURABLE_DAYS`.

use chrono::{DateTime, Duration, Utc};

use crate::error::AppError;
use crate::models::VideoStatus;

/// Whether a check-in is legal for a video in `status`.
pub fn can_perform_check_in(status: VideoStatus) -> bool {
    status == VideoStatus::Active
}

/// Deadline produced by a PREVENT_DISTRIBUTION check-in at `now`.
pub fn next_distribute_at(now: DateTime<Utc>, timer_days: i64) -> DateTime<Utc> {
    now + Duration::days(timer_days)
}

/// Expiration instant for a video distributed at `distributed_at`.
pub fn expires_at_for(distributed_at: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    distributed_at + Duration::days(retention_days)
}

/// Validate a requested timer length against `[1, max_timer_days]`.
pub fn validate_timer_days(timer_days: i64, max_timer_days: i64) -> Result<i64, AppError> {
    if timer_days < 1 || timer_days > max_timer_days {
        return Err(AppError::InvalidInput(format!(
            "timer_days must be between 1 and {}",
            max_timer_days
        )));
    }
    Ok(timer_days)
}
