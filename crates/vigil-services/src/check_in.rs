//! Check-in handling.
//!
//! A check-in is the owner's periodic signal: PREVENT_DISTRIBUTION pushes the
//! deadline out, ALLOW_DISTRIBUTION leaves it where it is. Either way an audit
//! row is written in the same transaction as the video update.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use vigil_core::lifecycle::{can_perform_check_in, next_distribute_at, validate_timer_days};
use vigil_core::models::{CheckIn, CheckInAction, CheckInOutcome, Video};
use vigil_core::AppError;
use vigil_db::{CheckInStore, VideoStore};

#[derive(Clone)]
pub struct CheckInService {
    videos: Arc<dyn VideoStore>,
    check_ins: Arc<dyn CheckInStore>,
    default_timer_days: i64,
    max_timer_days: i64,
}

impl CheckInService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        check_ins: Arc<dyn CheckInStore>,
        default_timer_days: i64,
        max_timer_days: i64,
    ) -> Self {
        Self {
            videos,
            check_ins,
            default_timer_days,
            max_timer_days,
        }
    }

    /// Check in on behalf of `owner_id`. Videos owned by someone else are reported as missing.
    #[tracing::instrument(skip(self))]
    pub async fn check_in_as_owner(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
        action: CheckInAction,
        timer_days: Option<i64>,
    ) -> Result<(Video, CheckIn), AppError> {
        let video = self.get_owned_video(owner_id, video_id).await?;

        if !can_perform_check_in(video.status) {
            return Err(invalid_state(video.status));
        }

        self.perform_check_in(video_id, action, timer_days).await
    }

    /// Apply a check-in to an ACTIVE video.
    ///
    /// `timer_days` only matters for PREVENT_DISTRIBUTION and falls back to the
    /// configured default.
    #[tracing::instrument(skip(self))]
    pub async fn perform_check_in(
        &self,
        video_id: Uuid,
        action: CheckInAction,
        timer_days: Option<i64>,
    ) -> Result<(Video, CheckIn), AppError> {
        let new_distribute_at = match action {
            CheckInAction::PreventDistribution => {
                let days = validate_timer_days(
                    timer_days.unwrap_or(self.default_timer_days),
                    self.max_timer_days,
                )?;
                Some(next_distribute_at(Utc::now(), days))
            }
            CheckInAction::AllowDistribution => None,
        };

        match self
            .videos
            .perform_check_in(video_id, action, new_distribute_at)
            .await?
        {
            CheckInOutcome::Applied { video, check_in } => {
                tracing::info!(
                    video_id = %video_id,
                    action = %action,
                    distribute_at = %video.distribute_at,
                    "Check-in recorded"
                );
                Ok((video, check_in))
            }
            CheckInOutcome::InvalidState(status) => Err(invalid_state(status)),
            CheckInOutcome::NotFound => Err(AppError::NotFound("Video not found".to_string())),
        }
    }

    /// Check-in history for one of the owner's videos, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_check_ins(
        &self,
        owner_id: Uuid,
        video_id: Uuid,
    ) -> Result<Vec<CheckIn>, AppError> {
        self.get_owned_video(owner_id, video_id).await?;
        Ok(self.check_ins.list_check_ins(video_id).await?)
    }

    /// One of the owner's videos. Videos owned by someone else are reported as missing.
    pub async fn get_owned_video(&self, owner_id: Uuid, video_id: Uuid) -> Result<Video, AppError> {
        self.videos
            .get_video(video_id)
            .await?
            .filter(|v| v.owner_id == owner_id)
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }
}

fn invalid_state(status: vigil_core::models::VideoStatus) -> AppError {
    AppError::InvalidState(format!(
        "Check-in is only allowed while the video is ACTIVE (current status: {})",
        status
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vigil_core::models::VideoStatus;
    use vigil_db::test_helpers::{video_fixture, MockStore};

    fn service(store: &MockStore) -> CheckInService {
        CheckInService::new(Arc::new(store.clone()), Arc::new(store.clone()), 30, 365)
    }

    fn setup(status: VideoStatus) -> (MockStore, Video) {
        let store = MockStore::new();
        let owner = Uuid::new_v4();
        store.add_default_user(owner);
        let video = video_fixture(owner, status, 1_000);
        store.add_video(video.clone());
        (store, video)
    }

    #[tokio::test]
    async fn test_prevent_sets_deadline_and_keeps_status() {
        let (store, video) = setup(VideoStatus::Active);

        let before = Utc::now();
        let (updated, check_in) = service(&store)
            .perform_check_in(video.id, CheckInAction::PreventDistribution, Some(14))
            .await
            .unwrap();
        let after = Utc::now();

        assert_eq!(updated.status, VideoStatus::Active);
        assert!(updated.distribute_at >= before + Duration::days(14));
        assert!(updated.distribute_at <= after + Duration::days(14));
        assert_eq!(check_in.action, CheckInAction::PreventDistribution);
        assert_eq!(check_in.video_id, video.id);
        assert_eq!(store.check_ins(video.id).len(), 1);
    }

    #[tokio::test]
    async fn test_allow_leaves_deadline_unchanged() {
        let (store, video) = setup(VideoStatus::Active);

        let (updated, _) = service(&store)
            .perform_check_in(video.id, CheckInAction::AllowDistribution, Some(14))
            .await
            .unwrap();

        assert_eq!(updated.distribute_at, video.distribute_at);
        assert_eq!(updated.status, VideoStatus::Active);
        assert_eq!(store.check_ins(video.id).len(), 1);
    }

    #[tokio::test]
    async fn test_prevent_uses_default_timer() {
        let (store, video) = setup(VideoStatus::Active);

        let (updated, _) = service(&store)
            .perform_check_in(video.id, CheckInAction::PreventDistribution, None)
            .await
            .unwrap();

        let expected = Utc::now() + Duration::days(30);
        assert!((updated.distribute_at - expected).num_seconds().abs() < 5);
    }

    #[tokio::test]
    async fn test_check_in_on_distributed_video_is_invalid_state() {
        let (store, video) = setup(VideoStatus::Distributed);

        let err = service(&store)
            .check_in_as_owner(
                video.owner_id,
                video.id,
                CheckInAction::PreventDistribution,
                Some(7),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(store.check_ins(video.id).is_empty());
        assert_eq!(store.video(video.id).unwrap().status, VideoStatus::Distributed);
    }

    #[tokio::test]
    async fn test_vanished_video_is_not_found() {
        let store = MockStore::new();
        let err = service(&store)
            .perform_check_in(Uuid::new_v4(), CheckInAction::AllowDistribution, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_other_owner_sees_not_found() {
        let (store, video) = setup(VideoStatus::Active);

        let err = service(&store)
            .check_in_as_owner(
                Uuid::new_v4(),
                video.id,
                CheckInAction::AllowDistribution,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_timer_out_of_range_is_rejected() {
        let (store, video) = setup(VideoStatus::Active);

        let err = service(&store)
            .perform_check_in(video.id, CheckInAction::PreventDistribution, Some(0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(store.check_ins(video.id).is_empty());
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let (store, video) = setup(VideoStatus::Active);
        let service = service(&store);

        service
            .perform_check_in(video.id, CheckInAction::AllowDistribution, None)
            .await
            .unwrap();
        service
            .perform_check_in(video.id, CheckInAction::PreventDistribution, Some(3))
            .await
            .unwrap();

        let history = service.list_check_ins(video.owner_id, video.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, CheckInAction::PreventDistribution);
        assert_eq!(history[1].action, CheckInAction::AllowDistribution);
    }
}
