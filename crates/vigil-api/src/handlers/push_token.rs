use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use vigil_core::AppError;
use vigil_infra::ErrorResponse;

use crate::auth::AuthUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

const MAX_PUSH_TOKEN_LENGTH: usize = 255;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PushTokenRequest {
    /// Device push token, or `null` to stop reminders.
    pub push_token: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/v0/me/push-token",
    tag = "users",
    request_body = PushTokenRequest,
    responses(
        (status = 204, description = "Push token stored"),
        (status = 400, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_push_token(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<PushTokenRequest>,
) -> Result<StatusCode, HttpAppError> {
    let push_token = request
        .push_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    if push_token
        .as_ref()
        .is_some_and(|t| t.len() > MAX_PUSH_TOKEN_LENGTH)
    {
        return Err(AppError::InvalidInput(format!(
            "push_token must be at most {} characters",
            MAX_PUSH_TOKEN_LENGTH
        ))
        .into());
    }

    let registered = push_token.is_some();
    if !state.users.set_push_token(user.user_id, push_token).await? {
        return Err(AppError::NotFound("User not found".to_string()).into());
    }

    tracing::info!(user_id = %user.user_id, registered, "Push token updated");
    Ok(StatusCode::NO_CONTENT)
}
