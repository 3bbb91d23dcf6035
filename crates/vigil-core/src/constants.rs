//! Application-wide constants.

/// Versioned prefix for authenticated API routes.
pub const API_PREFIX: &str = "/api/v0";

/// Days a distributed video stays retrievable before the expiration sweep removes it.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Timer applied to a fresh upload when the client does not pick one.
pub const DEFAULT_TIMER_DAYS: i64 = 30;

/// Upper bound for a single check-in timer.
pub const MAX_TIMER_DAYS: i64 = 365;

/// Largest accepted `MAX_TIMER_DAYS` / `RETENTION_DAYS` setting (about 100 years).
/// Keeps every deadline computed from them inside chrono's date range.
pub const MAX_CONFIGURABLE_DAYS: i64 = 36_500;

/// Storage quota granted to users without an explicit quota (1 GiB).
pub const DEFAULT_STORAGE_QUOTA_BYTES: i64 = 1024 * 1024 * 1024;

/// Push notification payload `type` for reminder messages.
pub const REMINDER_NOTIFICATION_TYPE: &str = "check_in_reminder";
