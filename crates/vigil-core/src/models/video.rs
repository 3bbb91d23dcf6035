use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of an escrowed video.
///
/// Ordering follows the lifecycle: a video only ever moves to a greater status.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "video_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    Pending,
    Active,
    Distributed,
    Expired,
}

impl Display for VideoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VideoStatus::Pending => write!(f, "PENDING"),
            VideoStatus::Active => write!(f, "ACTIVE"),
            VideoStatus::Distributed => write!(f, "DISTRIBUTED"),
            VideoStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    /// Storage key relative to the storage root.
    pub file_path: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub status: VideoStatus,
    pub distribute_at: DateTime<Utc>,
    pub distributed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub public_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a freshly uploaded video.
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub distribute_at: DateTime<Utc>,
    pub public_token: String,
}

/// ACTIVE video whose distribution deadline has passed.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DueVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub distribute_at: DateTime<Utc>,
}

/// ACTIVE video joined with its owner's push token, if any.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReminderCandidate {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub distribute_at: DateTime<Utc>,
    pub push_token: Option<String>,
}

/// DISTRIBUTED video whose retention window has elapsed.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ExpiringVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub file_path: String,
    pub file_size_bytes: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of inserting a video together with its storage charge.
#[derive(Debug, Clone)]
pub enum VideoCreation {
    Created(Video),
    /// The charge would take the owner past their quota. Nothing was written.
    QuotaExceeded { used_bytes: i64, quota_bytes: i64 },
}

/// Owner-facing view of a video. The storage key never leaves the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub status: VideoStatus,
    pub distribute_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub public_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        VideoResponse {
            id: video.id,
            title: video.title,
            file_size_bytes: video.file_size_bytes,
            mime_type: video.mime_type,
            status: video.status,
            distribute_at: video.distribute_at,
            distributed_at: video.distributed_at,
            expires_at: video.expires_at,
            public_token: video.public_token,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}
