use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool, Postgres};
use uuid::Uuid;

use vigil_core::models::UserStorage;

/// Apply a signed byte delta to a user's usage counter as one server-side update.
///
/// Used by the standalone accounting path and inside the expiration transaction.
pub async fn apply_storage_delta<'e, E>(executor: E, user_id: Uuid, delta_bytes: i64) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET storage_used_bytes = storage_used_bytes + $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(delta_bytes)
    .execute(executor)
    .await
    .context("Failed to update storage usage")?;

    if result.rows_affected() == 0 {
        return Err(anyhow::anyhow!("User {} not found", user_id));
    }

    Ok(())
}

/// Add `bytes` to a user's usage only if the result stays within the quota.
///
/// Returns `false` (and changes nothing) when the charge does not fit or the
/// user does not exist. Concurrent callers serialize on the user row, so the
/// quota can never be overshot.
pub async fn try_reserve_storage<'e, E>(executor: E, user_id: Uuid, bytes: i64) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE users
        SET storage_used_bytes = storage_used_bytes + $2, updated_at = NOW()
        WHERE id = $1 AND storage_used_bytes + $2 <= storage_quota_bytes
        "#,
    )
    .bind(user_id)
    .bind(bytes)
    .execute(executor)
    .await
    .context("Failed to reserve storage")?;

    Ok(result.rows_affected() > 0)
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %user_id))]
    pub async fn get_storage(&self, user_id: Uuid) -> Result<Option<UserStorage>> {
        let storage = sqlx::query_as::<Postgres, UserStorage>(
            r#"
            SELECT id, storage_quota_bytes, storage_used_bytes
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user storage")?;

        Ok(storage)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %user_id))]
    pub async fn update_storage_usage(&self, user_id: Uuid, delta_bytes: i64) -> Result<()> {
        apply_storage_delta(&self.pool, user_id, delta_bytes).await?;

        tracing::debug!(
            user_id = %user_id,
            delta_bytes = delta_bytes,
            "Storage usage updated"
        );

        Ok(())
    }

    #[tracing::instrument(skip(self, push_token), fields(db.table = "users", db.operation = "update", db.record_id = %user_id))]
    pub async fn set_push_token(&self, user_id: Uuid, push_token: Option<&str>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET push_token = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(push_token)
        .execute(&self.pool)
        .await
        .context("Failed to update push token")?;

        Ok(result.rows_affected() > 0)
    }
}
