use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use vigil_core::models::VideoResponse;
use vigil_core::AppError;
use vigil_infra::ErrorResponse;
use vigil_services::UploadRequest;

use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;

/// Upload a video. Text fields (`title`, `timer_days`) must come before `file`,
/// which is streamed straight to storage.
#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded and armed", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 413, description = "File too large or quota exceeded", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>), HttpAppError> {
    let mut title: Option<String> = None;
    let mut timer_days: Option<i64> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "timer_days" => {
                let raw = field.text().await?;
                let days = raw.trim().parse::<i64>().map_err(|_| {
                    AppError::InvalidInput(format!("timer_days must be an integer, got {:?}", raw))
                })?;
                timer_days = Some(days);
            }
            "file" => {
                let title = title.take().ok_or_else(|| {
                    AppError::InvalidInput("title must be sent before file".to_string())
                })?;
                let original_filename = field.file_name().unwrap_or("video.mp4").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();

                let body = Box::pin(field.map(|chunk| chunk.map_err(std::io::Error::other)));
                let request = UploadRequest {
                    title,
                    timer_days,
                    original_filename,
                    content_type,
                    reader: Box::pin(StreamReader::new(body)),
                };

                let video = state.upload.upload_video(user.user_id, request).await?;
                tracing::info!(
                    video_id = %video.id,
                    owner_id = %user.user_id,
                    file_size_bytes = video.file_size_bytes,
                    distribute_at = %video.distribute_at,
                    "Video uploaded"
                );
                return Ok((StatusCode::CREATED, Json(VideoResponse::from(video))));
            }
            _ => {
                tracing::debug!(field = %name, "Ignoring unknown multipart field");
            }
        }
    }

    Err(AppError::InvalidInput("Missing file field".to_string()).into())
}
