use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Video, VideoResponse, VideoStatus};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "check_in_action", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckInAction {
    /// Push the distribution deadline out by the requested number of days.
    PreventDistribution,
    /// Acknowledge without moving the deadline.
    AllowDistribution,
}

impl Display for CheckInAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CheckInAction::PreventDistribution => write!(f, "PREVENT_DISTRIBUTION"),
            CheckInAction::AllowDistribution => write!(f, "ALLOW_DISTRIBUTION"),
        }
    }
}

/// Append-only audit record of a check-in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CheckIn {
    pub id: Uuid,
    pub video_id: Uuid,
    pub action: CheckInAction,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    pub action: CheckInAction,
    /// Days until distribution when preventing. Falls back to the configured default.
    #[serde(default)]
    pub timer_days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub video: VideoResponse,
    pub check_in: CheckIn,
}

/// Outcome of applying a check-in inside the store's transaction.
#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    Applied { video: Video, check_in: CheckIn },
    /// The video was not ACTIVE when its row was locked.
    InvalidState(VideoStatus),
    NotFound,
}
