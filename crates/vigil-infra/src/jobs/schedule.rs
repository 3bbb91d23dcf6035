use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::JobRegistryError;

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;

/// When a job fires, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Every hour at `minute`.
    Hourly { minute: u32 },
    /// Every day at `hour:minute`.
    Daily { hour: u32, minute: u32 },
}

impl Schedule {
    pub fn hourly_at(minute: u32) -> Result<Self, JobRegistryError> {
        if minute > 59 {
            return Err(JobRegistryError::InvalidSchedule(format!(
                "minute {} out of range",
                minute
            )));
        }
        Ok(Schedule::Hourly { minute })
    }

    pub fn daily_at(hour: u32, minute: u32) -> Result<Self, JobRegistryError> {
        if hour > 23 || minute > 59 {
            return Err(JobRegistryError::InvalidSchedule(format!(
                "time {:02}:{:02} out of range",
                hour, minute
            )));
        }
        Ok(Schedule::Daily { hour, minute })
    }

    fn period_and_offset(&self) -> (i64, i64) {
        match *self {
            Schedule::Hourly { minute } => (SECONDS_PER_HOUR, i64::from(minute) * 60),
            Schedule::Daily { hour, minute } => (
                SECONDS_PER_DAY,
                i64::from(hour) * SECONDS_PER_HOUR + i64::from(minute) * 60,
            ),
        }
    }

    /// First firing strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (period, offset) = self.period_and_offset();
        let slots = (after.timestamp() - offset).div_euclid(period) + 1;
        DateTime::from_timestamp(slots * period + offset, 0)
    }
}

impl Display for Schedule {
    /// Cron notation, for logs.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Schedule::Hourly { minute } => write!(f, "{} * * * *", minute),
            Schedule::Daily { hour, minute } => write!(f, "{} {} * * *", minute, hour),
        }
    }
}
