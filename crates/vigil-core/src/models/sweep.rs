use serde::{Deserialize, Serialize};

/// One item that failed inside a sweep. The item is left untouched and retried next run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepError {
    pub id: String,
    pub error: String,
}

impl SweepError {
    pub fn new(id: impl ToString, error: impl ToString) -> Self {
        SweepError {
            id: id.to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionResult {
    pub processed: usize,
    pub distributed: usize,
    pub failed: usize,
    pub errors: Vec<SweepError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub videos_found: usize,
    pub notifications_attempted: usize,
    pub notifications_sent: usize,
    pub notifications_skipped: usize,
    pub notifications_failed: usize,
    pub errors: Vec<SweepError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationResult {
    pub processed: usize,
    pub expired: usize,
    pub failed: usize,
    pub bytes_freed: i64,
    pub errors: Vec<SweepError>,
}

/// Result of any sweep run, as reported to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sweep", rename_all = "snake_case")]
pub enum SweepOutcome {
    Distribution(DistributionResult),
    Notification(NotificationResult),
    Expiration(ExpirationResult),
}

impl SweepOutcome {
    /// Number of items that failed in this run.
    pub fn failed(&self) -> usize {
        match self {
            SweepOutcome::Distribution(r) => r.failed,
            SweepOutcome::Notification(r) => r.notifications_failed,
            SweepOutcome::Expiration(r) => r.failed,
        }
    }

    pub fn errors(&self) -> &[SweepError] {
        match self {
            SweepOutcome::Distribution(r) => &r.errors,
            SweepOutcome::Notification(r) => &r.errors,
            SweepOutcome::Expiration(r) => &r.errors,
        }
    }
}

impl From<DistributionResult> for SweepOutcome {
    fn from(result: DistributionResult) -> Self {
        SweepOutcome::Distribution(result)
    }
}

impl From<NotificationResult> for SweepOutcome {
    fn from(result: NotificationResult) -> Self {
        SweepOutcome::Notification(result)
    }
}

impl From<ExpirationResult> for SweepOutcome {
    fn from(result: ExpirationResult) -> Self {
        SweepOutcome::Expiration(result)
    }
}
