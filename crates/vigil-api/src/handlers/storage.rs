use axum::{extract::State, Json};
use std::sync::Arc;
use vigil_core::models::StorageQuotaCheck;
use vigil_infra::ErrorResponse;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v0/storage",
    tag = "storage",
    responses(
        (status = 200, description = "Quota and usage of the caller", body = StorageQuotaCheck),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_storage_usage(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<StorageQuotaCheck>, HttpAppError> {
    let usage = state
        .accounting
        .check_user_storage_quota(user.user_id, 0)
        .await?;
    Ok(Json(usage))
}
