use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use vigil_core::models::{CheckIn, CheckInRequest, CheckInResponse};
use vigil_infra::ErrorResponse;

use crate::auth::AuthUser;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/check-in",
    tag = "check-ins",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Check-in recorded", body = CheckInResponse),
        (status = 400, description = "Invalid timer", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 409, description = "Video is not ACTIVE", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_in(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CheckInRequest>,
) -> Result<Json<CheckInResponse>, HttpAppError> {
    let (video, check_in) = state
        .check_in
        .check_in_as_owner(user.user_id, id, request.action, request.timer_days)
        .await?;

    Ok(Json(CheckInResponse {
        video: video.into(),
        check_in,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}/check-ins",
    tag = "check-ins",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Check-in history, newest first", body = Vec<CheckIn>),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_check_ins(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CheckIn>>, HttpAppError> {
    Ok(Json(state.check_in.list_check_ins(user.user_id, id).await?))
}
