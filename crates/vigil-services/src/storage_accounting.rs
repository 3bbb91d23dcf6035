//! Per-user storage accounting.
//!
//! Usage only ever changes through signed deltas applied by the store as a
//! single atomic update; nothing here reads a counter and writes it back.

use std::sync::Arc;
use uuid::Uuid;

use vigil_core::models::StorageQuotaCheck;
use vigil_core::AppError;
use vigil_db::UserStore;

#[derive(Clone)]
pub struct StorageAccountingService {
    users: Arc<dyn UserStore>,
}

impl StorageAccountingService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Add `delta_bytes` (negative to release) to the user's usage.
    #[tracing::instrument(skip(self))]
    pub async fn update_user_storage_usage(
        &self,
        user_id: Uuid,
        delta_bytes: i64,
    ) -> Result<(), AppError> {
        self.users
            .update_storage_usage(user_id, delta_bytes)
            .await
            .map_err(AppError::from)
    }

    /// Check whether `candidate_bytes` more would fit in the user's quota.
    #[tracing::instrument(skip(self))]
    pub async fn check_user_storage_quota(
        &self,
        user_id: Uuid,
        candidate_bytes: i64,
    ) -> Result<StorageQuotaCheck, AppError> {
        let storage = self
            .users
            .get_storage(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let check = StorageQuotaCheck::evaluate(
            storage.storage_quota_bytes,
            storage.storage_used_bytes,
            candidate_bytes,
        );

        tracing::debug!(
            user_id = %user_id,
            candidate_bytes = candidate_bytes,
            remaining_bytes = check.remaining_bytes,
            has_quota = check.has_quota,
            "Storage quota checked"
        );

        Ok(check)
    }
}
