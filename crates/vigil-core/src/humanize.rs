//! Human readable durations for reminder messages.

use chrono::{DateTime, Utc};

/// Describe how long until `target`, e.g. `"2 days"`, `"5 hours"`, `"less than an hour"`.
///
/// Past targets are reported as `"now"`.
pub fn format_time_until(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = target - now;
    if remaining.num_seconds() <= 0 {
        return "now".to_string();
    }

    let days = remaining.num_days();
    if days >= 1 {
        return plural(days, "day");
    }

    let hours = remaining.num_hours();
    if hours >= 1 {
        return plural(hours, "hour");
    }

    "less than an hour".to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}
