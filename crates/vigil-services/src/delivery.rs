//! Public delivery of distributed videos.
//!
//! A video is looked up by its public token. Unknown tokens and videos that
//! have not been distributed yet produce the same not-found error, expired
//! videos are gone, and only DISTRIBUTED videos are streamed.

use std::path::Path;
use std::sync::Arc;

use vigil_core::models::{Video, VideoStatus};
use vigil_core::AppError;
use vigil_db::VideoStore;
use vigil_storage::{ByteStream, Storage};

/// Inclusive byte range of a partial response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub chunk_size: u64,
}

/// Parse a single `bytes=start-end` or `bytes=start-` range.
///
/// Returns `None` for anything that cannot be satisfied against `file_size`.
pub fn parse_range_header(header: &str, file_size: u64) -> Option<ByteRange> {
    let ranges = header.trim().strip_prefix("bytes=")?;
    let (start, end) = ranges.split_once('-')?;

    let start: u64 = start.trim().parse().ok()?;
    if start >= file_size {
        return None;
    }

    let end = match end.trim() {
        "" => file_size - 1,
        end => end.parse::<u64>().ok()?,
    };
    if end < start || end >= file_size {
        return None;
    }

    Some(ByteRange {
        start,
        end,
        chunk_size: end - start + 1,
    })
}

/// Download filename built from the title, keeping the stored file's extension.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`.
pub fn sanitize_filename(title: &str, file_path: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = if stem.is_empty() {
        "video".to_string()
    } else {
        stem
    };

    match Path::new(file_path).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", stem, ext),
        _ => stem,
    }
}

/// Everything needed to write a delivery response. The stream is opened last
/// and covers exactly `range` when one was requested.
pub struct Delivery {
    pub video: Video,
    pub file_size: u64,
    pub filename: String,
    pub range: Option<ByteRange>,
    pub stream: ByteStream,
}

#[derive(Clone)]
pub struct DeliveryService {
    videos: Arc<dyn VideoStore>,
    storage: Arc<dyn Storage>,
}

fn not_found() -> AppError {
    AppError::NotFound("Video not found".to_string())
}

impl DeliveryService {
    pub fn new(videos: Arc<dyn VideoStore>, storage: Arc<dyn Storage>) -> Self {
        Self { videos, storage }
    }

    /// Resolve a public token to a deliverable video.
    pub async fn resolve(&self, public_token: &str) -> Result<Video, AppError> {
        let video = self
            .videos
            .get_video_by_token(public_token)
            .await?
            .ok_or_else(not_found)?;

        match video.status {
            VideoStatus::Distributed => Ok(video),
            VideoStatus::Expired => Err(AppError::Gone("Video has expired".to_string())),
            VideoStatus::Pending | VideoStatus::Active => Err(not_found()),
        }
    }

    /// Resolve the token, validate `range_header` and open the matching byte stream.
    #[tracing::instrument(skip(self, public_token))]
    pub async fn open(
        &self,
        public_token: &str,
        range_header: Option<&str>,
    ) -> Result<Delivery, AppError> {
        let video = self.resolve(public_token).await?;

        let file_size = match self.storage.content_length(&video.file_path).await {
            Ok(size) => size,
            Err(e) if e.is_not_found() => {
                tracing::error!(
                    video_id = %video.id,
                    file_path = %video.file_path,
                    "Distributed video is missing from storage"
                );
                return Err(not_found());
            }
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };

        let range = match range_header {
            Some(header) => Some(
                parse_range_header(header, file_size)
                    .ok_or(AppError::RangeNotSatisfiable { file_size })?,
            ),
            None => None,
        };

        let stream = match range {
            Some(r) => {
                self.storage
                    .download_range_stream(&video.file_path, r.start, r.end)
                    .await
            }
            None => self.storage.download_stream(&video.file_path).await,
        }
        .map_err(|e| AppError::Storage(e.to_string()))?;

        let filename = sanitize_filename(&video.title, &video.file_path);

        Ok(Delivery {
            video,
            file_size,
            filename,
            range,
            stream,
        })
    }
}
