use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Every background job the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobName {
    VideoDistribution,
    CheckInReminder,
    VideoExpiration,
}

impl JobName {
    pub const ALL: [JobName; 3] = [
        JobName::VideoDistribution,
        JobName::CheckInReminder,
        JobName::VideoExpiration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::VideoDistribution => "video-distribution",
            JobName::CheckInReminder => "check-in-reminder",
            JobName::VideoExpiration => "video-expiration",
        }
    }
}

impl Display for JobName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
