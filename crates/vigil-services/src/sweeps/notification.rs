use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use vigil_core::constants::REMINDER_NOTIFICATION_TYPE;
use vigil_core::humanize::format_time_until;
use vigil_core::models::{NotificationResult, ReminderCandidate, SweepError, SweepOutcome};
use vigil_db::VideoStore;
use vigil_infra::JobHandler;

use crate::push::PushSender;

pub const REMINDER_TITLE: &str = "Check-in reminder";

/// Reminder text for a video due at `distribute_at`.
pub fn reminder_body(title: &str, distribute_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match format_time_until(distribute_at, now).as_str() {
        "now" => format!(
            "\"{}\" is due for distribution. Check in now to keep it private.",
            title
        ),
        remaining => format!(
            "\"{}\" will be distributed in {}. Check in to keep it private.",
            title, remaining
        ),
    }
}

/// Sends a reminder push for every ACTIVE video whose owner registered a device.
#[derive(Clone)]
pub struct NotificationSweep {
    videos: Arc<dyn VideoStore>,
    push: Option<Arc<dyn PushSender>>,
}

impl NotificationSweep {
    pub fn new(videos: Arc<dyn VideoStore>, push: Option<Arc<dyn PushSender>>) -> Self {
        Self { videos, push }
    }

    #[tracing::instrument(skip(self), fields(sweep = "notification"))]
    pub async fn process(&self, reference_time: DateTime<Utc>) -> Result<NotificationResult> {
        let candidates = self
            .videos
            .find_active_with_push_tokens()
            .await
            .context("Failed to query active videos for reminders")?;

        let mut result = NotificationResult {
            videos_found: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return Ok(result);
        }

        let Some(push) = self.push.as_ref() else {
            tracing::info!(
                videos_found = result.videos_found,
                "Push notifications disabled, skipping reminders"
            );
            result.notifications_skipped = result.videos_found;
            return Ok(result);
        };

        for candidate in candidates {
            let Some(token) = candidate.push_token.as_deref().filter(|t| !t.is_empty()) else {
                result.notifications_skipped += 1;
                tracing::debug!(video_id = %candidate.id, "Owner has no push token, skipping");
                continue;
            };

            result.notifications_attempted += 1;
            match self.send_reminder(push.as_ref(), token, &candidate, reference_time).await {
                Ok(message_id) => {
                    result.notifications_sent += 1;
                    tracing::info!(
                        video_id = %candidate.id,
                        owner_id = %candidate.owner_id,
                        message_id = %message_id,
                        "Reminder sent"
                    );
                }
                Err(e) => {
                    result.notifications_failed += 1;
                    tracing::warn!(
                        error = %e,
                        video_id = %candidate.id,
                        "Failed to send reminder"
                    );
                    result
                        .errors
                        .push(SweepError::new(candidate.id, format!("{:#}", e)));
                }
            }
        }

        Ok(result)
    }

    async fn send_reminder(
        &self,
        push: &dyn PushSender,
        token: &str,
        candidate: &ReminderCandidate,
        reference_time: DateTime<Utc>,
    ) -> Result<String> {
        let body = reminder_body(&candidate.title, candidate.distribute_at, reference_time);
        let data = json!({
            "type": REMINDER_NOTIFICATION_TYPE,
            "video_id": candidate.id,
        });

        push.send(token, REMINDER_TITLE, &body, data)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Push gateway returned no message id"))
    }
}

#[async_trait]
impl JobHandler for NotificationSweep {
    async fn run(&self, reference_time: DateTime<Utc>) -> Result<SweepOutcome> {
        Ok(self.process(reference_time).await?.into())
    }
}
