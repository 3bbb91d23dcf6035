use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use vigil_core::models::CheckIn;

/// Read access to the check-in audit trail. Rows are written by
/// [`VideoRepository::perform_check_in`](super::VideoRepository::perform_check_in).
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "check_ins", db.operation = "select"))]
    pub async fn list_for_video(&self, video_id: Uuid) -> Result<Vec<CheckIn>> {
        let check_ins = sqlx::query_as::<Postgres, CheckIn>(
            r#"
            SELECT id, video_id, action, created_at
            FROM check_ins
            WHERE video_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list check-ins")?;

        Ok(check_ins)
    }
}
