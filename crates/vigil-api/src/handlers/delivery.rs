//! Public delivery of distributed videos with HTTP range support.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use vigil_core::AppError;
use vigil_infra::ErrorResponse;

use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/videos/{token}",
    tag = "delivery",
    params(
        ("token" = String, Path, description = "Public video token"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. bytes=0-1023")
    ),
    responses(
        (status = 200, description = "Whole video", content_type = "video/*"),
        (status = 206, description = "Requested byte range", content_type = "video/*"),
        (status = 404, description = "Unknown token or video not distributed", body = ErrorResponse),
        (status = 410, description = "Video has expired", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn deliver_video(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    // A Range header that is not valid text cannot be satisfied either.
    let range_header = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or(""));

    let delivery = state.delivery.open(&token, range_header).await?;

    let video_id = delivery.video.id;
    let body_stream = delivery.stream.map(move |result| {
        result.map_err(|e| {
            tracing::error!(error = %e, video_id = %video_id, "Video stream failed mid-response");
            std::io::Error::other(format!("Storage stream error: {}", e))
        })
    });

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, delivery.video.mime_type.as_str())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", delivery.filename),
        );

    builder = match delivery.range {
        Some(range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_LENGTH, range.chunk_size)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, delivery.file_size),
            ),
        None => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, delivery.file_size),
    };

    builder.body(Body::from_stream(body_stream)).map_err(|e| {
        tracing::error!(error = %e, video_id = %video_id, "Failed to build delivery response");
        HttpAppError(AppError::Internal("Failed to build response".to_string()))
    })
}
