//! Store trait abstractions
//!
//! Services and sweeps depend on these traits rather than on the concrete
//! repositories, so they can run against the in-memory stores in
//! [`test_helpers`](crate::test_helpers) without a database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use vigil_core::models::{
    CheckIn, CheckInAction, CheckInOutcome, DueVideo, ExpiringVideo, NewVideo, ReminderCandidate,
    UserStorage, Video, VideoCreation,
};

use crate::db::{CheckInRepository, UserRepository, VideoRepository};

/// Video lifecycle persistence.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert an ACTIVE video and add its size to the owner's usage atomically,
    /// unless that would exceed the owner's quota.
    async fn create_video(&self, video: NewVideo) -> Result<VideoCreation>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>>;

    async fn get_video_by_token(&self, public_token: &str) -> Result<Option<Video>>;

    /// Insert a check-in and optionally move `distribute_at`, atomically with the video row.
    async fn perform_check_in(
        &self,
        video_id: Uuid,
        action: CheckInAction,
        new_distribute_at: Option<DateTime<Utc>>,
    ) -> Result<CheckInOutcome>;

    /// ACTIVE videos with `distribute_at <= reference_time`.
    async fn find_due_for_distribution(&self, reference_time: DateTime<Utc>)
        -> Result<Vec<DueVideo>>;

    /// Returns `false` when the video had already left ACTIVE.
    async fn mark_distributed(
        &self,
        id: Uuid,
        distributed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Every ACTIVE video joined with its owner's push token.
    async fn find_active_with_push_tokens(&self) -> Result<Vec<ReminderCandidate>>;

    /// DISTRIBUTED videos with `expires_at <= reference_time`.
    async fn find_due_for_expiration(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<ExpiringVideo>>;

    /// DISTRIBUTED -> EXPIRED plus the usage decrement as one unit.
    /// Returns `false` when the video had already left DISTRIBUTED.
    async fn mark_expired(&self, id: Uuid, owner_id: Uuid, file_size_bytes: i64) -> Result<bool>;
}

/// Check-in audit trail.
#[async_trait]
pub trait CheckInStore: Send + Sync {
    /// Newest first.
    async fn list_check_ins(&self, video_id: Uuid) -> Result<Vec<CheckIn>>;
}

/// User storage counters and push registration.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_storage(&self, user_id: Uuid) -> Result<Option<UserStorage>>;

    /// Server-side atomic `storage_used_bytes += delta_bytes`.
    async fn update_storage_usage(&self, user_id: Uuid, delta_bytes: i64) -> Result<()>;

    /// Returns `false` when the user does not exist.
    async fn set_push_token(&self, user_id: Uuid, push_token: Option<String>) -> Result<bool>;
}

// Implementations for concrete repository types

#[async_trait]
impl VideoStore for VideoRepository {
    async fn create_video(&self, video: NewVideo) -> Result<VideoCreation> {
        VideoRepository::create_video(self, &video).await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        VideoRepository::get_video(self, id).await
    }

    async fn get_video_by_token(&self, public_token: &str) -> Result<Option<Video>> {
        VideoRepository::get_video_by_token(self, public_token).await
    }

    async fn perform_check_in(
        &self,
        video_id: Uuid,
        action: CheckInAction,
        new_distribute_at: Option<DateTime<Utc>>,
    ) -> Result<CheckInOutcome> {
        VideoRepository::perform_check_in(self, video_id, action, new_distribute_at).await
    }

    async fn find_due_for_distribution(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<DueVideo>> {
        VideoRepository::find_due_for_distribution(self, reference_time).await
    }

    async fn mark_distributed(
        &self,
        id: Uuid,
        distributed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        VideoRepository::mark_distributed(self, id, distributed_at, expires_at).await
    }

    async fn find_active_with_push_tokens(&self) -> Result<Vec<ReminderCandidate>> {
        VideoRepository::find_active_with_push_tokens(self).await
    }

    async fn find_due_for_expiration(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<ExpiringVideo>> {
        VideoRepository::find_due_for_expiration(self, reference_time).await
    }

    async fn mark_expired(&self, id: Uuid, owner_id: Uuid, file_size_bytes: i64) -> Result<bool> {
        VideoRepository::mark_expired(self, id, owner_id, file_size_bytes).await
    }
}

#[async_trait]
impl CheckInStore for CheckInRepository {
    async fn list_check_ins(&self, video_id: Uuid) -> Result<Vec<CheckIn>> {
        self.list_for_video(video_id).await
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_storage(&self, user_id: Uuid) -> Result<Option<UserStorage>> {
        UserRepository::get_storage(self, user_id).await
    }

    async fn update_storage_usage(&self, user_id: Uuid, delta_bytes: i64) -> Result<()> {
        UserRepository::update_storage_usage(self, user_id, delta_bytes).await
    }

    async fn set_push_token(&self, user_id: Uuid, push_token: Option<String>) -> Result<bool> {
        UserRepository::set_push_token(self, user_id, push_token.as_deref()).await
    }
}
