use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use vigil_core::models::{
    CheckIn, CheckInAction, CheckInOutcome, DueVideo, ExpiringVideo, NewVideo, ReminderCandidate,
    UserStorage, Video, VideoCreation, VideoStatus,
};

use super::user::{apply_storage_delta, try_reserve_storage};

const VIDEO_COLUMNS: &str = r#"
    id, owner_id, title, file_path, file_size_bytes, mime_type, status,
    distribute_at, distributed_at, expires_at, public_token, created_at, updated_at
"#;

#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Charge the owner's quota and insert an ACTIVE video in one transaction.
    ///
    /// The charge is conditional on the quota, so two uploads racing past the
    /// service-level quota check cannot both be stored.
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", db.record_id = %video.id))]
    pub async fn create_video(&self, video: &NewVideo) -> Result<VideoCreation> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for video creation")?;

        if !try_reserve_storage(&mut *tx, video.owner_id, video.file_size_bytes).await? {
            let storage = sqlx::query_as::<Postgres, UserStorage>(
                "SELECT id, storage_quota_bytes, storage_used_bytes FROM users WHERE id = $1",
            )
            .bind(video.owner_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch user storage")?;
            tx.rollback().await.ok();

            let storage =
                storage.ok_or_else(|| anyhow::anyhow!("User {} not found", video.owner_id))?;
            return Ok(VideoCreation::QuotaExceeded {
                used_bytes: storage.storage_used_bytes,
                quota_bytes: storage.storage_quota_bytes,
            });
        }

        let sql = format!(
            r#"
            INSERT INTO videos (
                id, owner_id, title, file_path, file_size_bytes, mime_type,
                status, distribute_at, public_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );

        let created = sqlx::query_as::<Postgres, Video>(&sql)
            .bind(video.id)
            .bind(video.owner_id)
            .bind(&video.title)
            .bind(&video.file_path)
            .bind(video.file_size_bytes)
            .bind(&video.mime_type)
            .bind(VideoStatus::Active)
            .bind(video.distribute_at)
            .bind(&video.public_token)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert video")?;

        tx.commit()
            .await
            .context("Failed to commit video creation")?;

        tracing::info!(
            video_id = %created.id,
            owner_id = %created.owner_id,
            file_size_bytes = created.file_size_bytes,
            distribute_at = %created.distribute_at,
            "Video created"
        );

        Ok(VideoCreation::Created(created))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        let sql = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        let video = sqlx::query_as::<Postgres, Video>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch video")?;

        Ok(video)
    }

    #[tracing::instrument(skip(self, public_token), fields(db.table = "videos", db.operation = "select"))]
    pub async fn get_video_by_token(&self, public_token: &str) -> Result<Option<Video>> {
        let sql = format!("SELECT {} FROM videos WHERE public_token = $1", VIDEO_COLUMNS);
        let video = sqlx::query_as::<Postgres, Video>(&sql)
            .bind(public_token)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch video by token")?;

        Ok(video)
    }

    /// Record a check-in and, when `new_distribute_at` is set, move the deadline.
    ///
    /// The video row is locked for the duration of the transaction so a concurrent
    /// sweep cannot distribute it between the status check and the update.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %video_id))]
    pub async fn perform_check_in(
        &self,
        video_id: Uuid,
        action: CheckInAction,
        new_distribute_at: Option<DateTime<Utc>>,
    ) -> Result<CheckInOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for check-in")?;

        let status: Option<VideoStatus> =
            sqlx::query_scalar("SELECT status FROM videos WHERE id = $1 FOR UPDATE")
                .bind(video_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock video for check-in")?;

        let status = match status {
            Some(status) => status,
            None => return Ok(CheckInOutcome::NotFound),
        };
        if status != VideoStatus::Active {
            return Ok(CheckInOutcome::InvalidState(status));
        }

        let check_in = sqlx::query_as::<Postgres, CheckIn>(
            r#"
            INSERT INTO check_ins (id, video_id, action)
            VALUES ($1, $2, $3)
            RETURNING id, video_id, action, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(video_id)
        .bind(action)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert check-in")?;

        let sql = format!(
            r#"
            UPDATE videos
            SET distribute_at = COALESCE($2, distribute_at), updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );
        let video = sqlx::query_as::<Postgres, Video>(&sql)
            .bind(video_id)
            .bind(new_distribute_at)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to update video for check-in")?;

        tx.commit().await.context("Failed to commit check-in")?;

        Ok(CheckInOutcome::Applied { video, check_in })
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn find_due_for_distribution(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<DueVideo>> {
        let videos = sqlx::query_as::<Postgres, DueVideo>(
            r#"
            SELECT id, owner_id, title, distribute_at
            FROM videos
            WHERE status = 'ACTIVE' AND distribute_at <= $1
            ORDER BY distribute_at ASC
            "#,
        )
        .bind(reference_time)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query videos due for distribution")?;

        Ok(videos)
    }

    /// ACTIVE -> DISTRIBUTED. Returns `false` when the video was no longer ACTIVE.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn mark_distributed(
        &self,
        id: Uuid,
        distributed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET status = 'DISTRIBUTED', distributed_at = $2, expires_at = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'ACTIVE'
            "#,
        )
        .bind(id)
        .bind(distributed_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .context("Failed to mark video distributed")?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn find_active_with_push_tokens(&self) -> Result<Vec<ReminderCandidate>> {
        let videos = sqlx::query_as::<Postgres, ReminderCandidate>(
            r#"
            SELECT v.id, v.owner_id, v.title, v.distribute_at, u.push_token
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE v.status = 'ACTIVE'
            ORDER BY v.distribute_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query active videos for reminders")?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn find_due_for_expiration(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<ExpiringVideo>> {
        let videos = sqlx::query_as::<Postgres, ExpiringVideo>(
            r#"
            SELECT id, owner_id, file_path, file_size_bytes, expires_at
            FROM videos
            WHERE status = 'DISTRIBUTED' AND expires_at <= $1
            ORDER BY expires_at ASC
            "#,
        )
        .bind(reference_time)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query videos due for expiration")?;

        Ok(videos)
    }

    /// DISTRIBUTED -> EXPIRED and release the owner's bytes, atomically.
    ///
    /// Returns `false` (and changes nothing) when the video was no longer DISTRIBUTED.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn mark_expired(&self, id: Uuid, owner_id: Uuid, file_size_bytes: i64) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction for expiration")?;

        let result = sqlx::query(
            r#"
            UPDATE videos
            SET status = 'EXPIRED', updated_at = NOW()
            WHERE id = $1 AND status = 'DISTRIBUTED'
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to mark video expired")?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Ok(false);
        }

        apply_storage_delta(&mut *tx, owner_id, -file_size_bytes).await?;

        tx.commit().await.context("Failed to commit expiration")?;

        Ok(true)
    }
}
