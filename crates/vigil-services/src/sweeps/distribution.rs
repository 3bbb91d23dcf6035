use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use vigil_core::lifecycle::expires_at_for;
use vigil_core::models::{DistributionResult, SweepError, SweepOutcome};
use vigil_db::VideoStore;
use vigil_infra::JobHandler;

/// Moves ACTIVE videos whose deadline has passed to DISTRIBUTED.
#[derive(Clone)]
pub struct DistributionSweep {
    videos: Arc<dyn VideoStore>,
    retention_days: i64,
}

impl DistributionSweep {
    pub fn new(videos: Arc<dyn VideoStore>, retention_days: i64) -> Self {
        Self {
            videos,
            retention_days,
        }
    }

    #[tracing::instrument(skip(self), fields(sweep = "distribution"))]
    pub async fn process(&self, reference_time: DateTime<Utc>) -> Result<DistributionResult> {
        let due = self
            .videos
            .find_due_for_distribution(reference_time)
            .await
            .context("Failed to query videos due for distribution")?;

        let mut result = DistributionResult::default();
        if due.is_empty() {
            tracing::debug!("No videos due for distribution");
            return Ok(result);
        }

        tracing::info!(count = due.len(), "Distributing due videos");

        for video in due {
            result.processed += 1;

            let distributed_at = Utc::now();
            let expires_at = expires_at_for(distributed_at, self.retention_days);

            match self
                .videos
                .mark_distributed(video.id, distributed_at, expires_at)
                .await
            {
                Ok(true) => {
                    result.distributed += 1;
                    tracing::info!(
                        video_id = %video.id,
                        owner_id = %video.owner_id,
                        distribute_at = %video.distribute_at,
                        expires_at = %expires_at,
                        "Video distributed"
                    );
                }
                Ok(false) => {
                    tracing::info!(
                        video_id = %video.id,
                        "Video already left ACTIVE, skipping"
                    );
                }
                Err(e) => {
                    result.failed += 1;
                    tracing::error!(
                        error = %e,
                        video_id = %video.id,
                        "Failed to distribute video"
                    );
                    result.errors.push(SweepError::new(video.id, format!("{:#}", e)));
                }
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl JobHandler for DistributionSweep {
    async fn run(&self, reference_time: DateTime<Utc>) -> Result<SweepOutcome> {
        Ok(self.process(reference_time).await?.into())
    }
}
