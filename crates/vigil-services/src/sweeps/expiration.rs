use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use vigil_core::models::{ExpirationResult, ExpiringVideo, SweepError, SweepOutcome};
use vigil_db::VideoStore;
use vigil_infra::JobHandler;
use vigil_storage::Storage;

/// Deletes the files of DISTRIBUTED videos past retention and marks them EXPIRED.
#[derive(Clone)]
pub struct ExpirationSweep {
    videos: Arc<dyn VideoStore>,
    storage: Arc<dyn Storage>,
}

impl ExpirationSweep {
    pub fn new(videos: Arc<dyn VideoStore>, storage: Arc<dyn Storage>) -> Self {
        Self { videos, storage }
    }

    #[tracing::instrument(skip(self), fields(sweep = "expiration"))]
    pub async fn process(&self, reference_time: DateTime<Utc>) -> Result<ExpirationResult> {
        let due = self
            .videos
            .find_due_for_expiration(reference_time)
            .await
            .context("Failed to query videos due for expiration")?;

        let mut result = ExpirationResult::default();
        if due.is_empty() {
            tracing::debug!("No videos due for expiration");
            return Ok(result);
        }

        tracing::info!(count = due.len(), "Expiring videos past retention");

        for video in due {
            result.processed += 1;

            match self.expire(&video).await {
                Ok(true) => {
                    result.expired += 1;
                    result.bytes_freed += video.file_size_bytes;
                    tracing::info!(
                        video_id = %video.id,
                        owner_id = %video.owner_id,
                        bytes_freed = video.file_size_bytes,
                        "Video expired"
                    );
                }
                Ok(false) => {
                    tracing::info!(video_id = %video.id, "Video already left DISTRIBUTED, skipping");
                }
                Err(e) => {
                    result.failed += 1;
                    tracing::error!(error = %e, video_id = %video.id, "Failed to expire video");
                    result.errors.push(SweepError::new(video.id, format!("{:#}", e)));
                }
            }
        }

        Ok(result)
    }

    async fn expire(&self, video: &ExpiringVideo) -> Result<bool> {
        match self.storage.delete(&video.file_path).await {
            Ok(()) => {
                tracing::debug!(file_path = %video.file_path, "Deleted video file");
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    video_id = %video.id,
                    file_path = %video.file_path,
                    "Video file already absent, continuing"
                );
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context("Failed to delete video file"));
            }
        }

        self.videos
            .mark_expired(video.id, video.owner_id, video.file_size_bytes)
            .await
    }
}

#[async_trait]
impl JobHandler for ExpirationSweep {
    async fn run(&self, reference_time: DateTime<Utc>) -> Result<SweepOutcome> {
        Ok(self.process(reference_time).await?.into())
    }
}
