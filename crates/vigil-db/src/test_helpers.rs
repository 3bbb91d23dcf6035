//! In-memory store implementations for tests
//!
//! [`MockStore`] implements every store trait over shared in-memory state with
//! the same status predicates as the SQL repositories, so sweeps and services
//! can be exercised without a database. Failures can be injected per operation
//! and per record with [`MockStore::fail_on`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use vigil_core::constants::DEFAULT_STORAGE_QUOTA_BYTES;
use vigil_core::models::{
    CheckIn, CheckInAction, CheckInOutcome, DueVideo, ExpiringVideo, NewVideo, ReminderCandidate,
    UserStorage, Video, VideoCreation, VideoStatus,
};

use crate::store_traits::{CheckInStore, UserStore, VideoStore};

#[derive(Debug, Clone)]
struct MockUser {
    storage: UserStorage,
    push_token: Option<String>,
}

#[derive(Default)]
struct MockState {
    videos: HashMap<Uuid, Video>,
    check_ins: Vec<CheckIn>,
    users: HashMap<Uuid, MockUser>,
    failures: HashMap<(&'static str, Option<Uuid>), String>,
    /// Usage added right before the next `create_video` for that user.
    interleaved_charges: HashMap<Uuid, i64>,
}

impl MockState {
    fn injected(&self, operation: &'static str, id: Option<Uuid>) -> Result<()> {
        let message = id
            .and_then(|id| self.failures.get(&(operation, Some(id))))
            .or_else(|| self.failures.get(&(operation, None)));
        match message {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(()),
        }
    }

    fn apply_delta(&mut self, user_id: Uuid, delta_bytes: i64) -> Result<()> {
        let user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow::anyhow!("User {} not found", user_id))?;
        user.storage.storage_used_bytes += delta_bytes;
        Ok(())
    }
}

/// Shared in-memory store. Clones see the same state.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<MockState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` (a store trait method name) fail with `message`, either for
    /// one record or, with `id = None`, for every call.
    pub fn fail_on(&self, operation: &'static str, id: Option<Uuid>, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation, id), message.to_string());
    }

    /// Let another upload of `bytes` commit for `user_id` between the caller's
    /// quota check and its next `create_video`.
    pub fn interleave_upload(&self, user_id: Uuid, bytes: i64) {
        self.state
            .lock()
            .unwrap()
            .interleaved_charges
            .insert(user_id, bytes);
    }

    pub fn add_user(&self, user_id: Uuid, quota_bytes: i64, used_bytes: i64) {
        self.state.lock().unwrap().users.insert(
            user_id,
            MockUser {
                storage: UserStorage {
                    id: user_id,
                    storage_quota_bytes: quota_bytes,
                    storage_used_bytes: used_bytes,
                },
                push_token: None,
            },
        );
    }

    /// User with the default quota and no usage.
    pub fn add_default_user(&self, user_id: Uuid) {
        self.add_user(user_id, DEFAULT_STORAGE_QUOTA_BYTES, 0);
    }

    pub fn set_user_push_token(&self, user_id: Uuid, token: Option<&str>) {
        if let Some(user) = self.state.lock().unwrap().users.get_mut(&user_id) {
            user.push_token = token.map(String::from);
        }
    }

    pub fn add_video(&self, video: Video) {
        self.state.lock().unwrap().videos.insert(video.id, video);
    }

    pub fn video(&self, id: Uuid) -> Option<Video> {
        self.state.lock().unwrap().videos.get(&id).cloned()
    }

    pub fn user_storage(&self, user_id: Uuid) -> Option<UserStorage> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(&user_id)
            .map(|u| u.storage.clone())
    }

    pub fn check_ins(&self, video_id: Uuid) -> Vec<CheckIn> {
        self.state
            .lock()
            .unwrap()
            .check_ins
            .iter()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect()
    }
}

/// A video in `status` with timestamps consistent with that status.
///
/// ACTIVE videos are due one hour before `now`; DISTRIBUTED videos expire one
/// hour before `now`.
pub fn video_fixture(owner_id: Uuid, status: VideoStatus, file_size_bytes: i64) -> Video {
    let now = Utc::now();
    let id = Uuid::new_v4();
    let created_at = now - Duration::days(40);
    let (distributed_at, expires_at) = match status {
        VideoStatus::Pending | VideoStatus::Active => (None, None),
        VideoStatus::Distributed | VideoStatus::Expired => {
            let distributed = now - Duration::days(7) - Duration::hours(1);
            (Some(distributed), Some(distributed + Duration::days(7)))
        }
    };

    Video {
        id,
        owner_id,
        title: format!("Video {}", id),
        file_path: format!("videos/{}/{}.mp4", owner_id, id),
        file_size_bytes,
        mime_type: "video/mp4".to_string(),
        status,
        distribute_at: distributed_at.unwrap_or(now - Duration::hours(1)),
        distributed_at,
        expires_at,
        public_token: format!("{:x}", id.as_u128()),
        created_at,
        updated_at: created_at,
    }
}

#[async_trait]
impl VideoStore for MockStore {
    async fn create_video(&self, video: NewVideo) -> Result<VideoCreation> {
        let mut state = self.state.lock().unwrap();
        state.injected("create_video", Some(video.owner_id))?;
        if let Some(bytes) = state.interleaved_charges.remove(&video.owner_id) {
            state.apply_delta(video.owner_id, bytes)?;
        }
        let storage = state
            .users
            .get(&video.owner_id)
            .map(|u| u.storage.clone())
            .ok_or_else(|| anyhow::anyhow!("User {} not found", video.owner_id))?;
        if storage.storage_used_bytes + video.file_size_bytes > storage.storage_quota_bytes {
            return Ok(VideoCreation::QuotaExceeded {
                used_bytes: storage.storage_used_bytes,
                quota_bytes: storage.storage_quota_bytes,
            });
        }

        let now = Utc::now();
        let created = Video {
            id: video.id,
            owner_id: video.owner_id,
            title: video.title,
            file_path: video.file_path,
            file_size_bytes: video.file_size_bytes,
            mime_type: video.mime_type,
            status: VideoStatus::Active,
            distribute_at: video.distribute_at,
            distributed_at: None,
            expires_at: None,
            public_token: video.public_token,
            created_at: now,
            updated_at: now,
        };
        state.apply_delta(created.owner_id, created.file_size_bytes)?;
        state.videos.insert(created.id, created.clone());
        Ok(VideoCreation::Created(created))
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        let state = self.state.lock().unwrap();
        state.injected("get_video", Some(id))?;
        Ok(state.videos.get(&id).cloned())
    }

    async fn get_video_by_token(&self, public_token: &str) -> Result<Option<Video>> {
        let state = self.state.lock().unwrap();
        state.injected("get_video_by_token", None)?;
        Ok(state
            .videos
            .values()
            .find(|v| v.public_token == public_token)
            .cloned())
    }

    async fn perform_check_in(
        &self,
        video_id: Uuid,
        action: CheckInAction,
        new_distribute_at: Option<DateTime<Utc>>,
    ) -> Result<CheckInOutcome> {
        let mut state = self.state.lock().unwrap();
        state.injected("perform_check_in", Some(video_id))?;

        let now = Utc::now();
        let video = match state.videos.get_mut(&video_id) {
            Some(video) => video,
            None => return Ok(CheckInOutcome::NotFound),
        };
        if video.status != VideoStatus::Active {
            return Ok(CheckInOutcome::InvalidState(video.status));
        }

        if let Some(distribute_at) = new_distribute_at {
            video.distribute_at = distribute_at;
        }
        video.updated_at = now;
        let video = video.clone();

        let check_in = CheckIn {
            id: Uuid::new_v4(),
            video_id,
            action,
            created_at: now,
        };
        state.check_ins.push(check_in.clone());

        Ok(CheckInOutcome::Applied { video, check_in })
    }

    async fn find_due_for_distribution(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<DueVideo>> {
        let state = self.state.lock().unwrap();
        state.injected("find_due_for_distribution", None)?;
        let mut due: Vec<DueVideo> = state
            .videos
            .values()
            .filter(|v| v.status == VideoStatus::Active && v.distribute_at <= reference_time)
            .map(|v| DueVideo {
                id: v.id,
                owner_id: v.owner_id,
                title: v.title.clone(),
                distribute_at: v.distribute_at,
            })
            .collect();
        due.sort_by_key(|v| v.distribute_at);
        Ok(due)
    }

    async fn mark_distributed(
        &self,
        id: Uuid,
        distributed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.injected("mark_distributed", Some(id))?;
        match state.videos.get_mut(&id) {
            Some(video) if video.status == VideoStatus::Active => {
                video.status = VideoStatus::Distributed;
                video.distributed_at = Some(distributed_at);
                video.expires_at = Some(expires_at);
                video.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_active_with_push_tokens(&self) -> Result<Vec<ReminderCandidate>> {
        let state = self.state.lock().unwrap();
        state.injected("find_active_with_push_tokens", None)?;
        let mut candidates: Vec<ReminderCandidate> = state
            .videos
            .values()
            .filter(|v| v.status == VideoStatus::Active)
            .filter_map(|v| {
                state.users.get(&v.owner_id).map(|u| ReminderCandidate {
                    id: v.id,
                    owner_id: v.owner_id,
                    title: v.title.clone(),
                    distribute_at: v.distribute_at,
                    push_token: u.push_token.clone(),
                })
            })
            .collect();
        candidates.sort_by_key(|c| c.distribute_at);
        Ok(candidates)
    }

    async fn find_due_for_expiration(
        &self,
        reference_time: DateTime<Utc>,
    ) -> Result<Vec<ExpiringVideo>> {
        let state = self.state.lock().unwrap();
        state.injected("find_due_for_expiration", None)?;
        let mut due: Vec<ExpiringVideo> = state
            .videos
            .values()
            .filter(|v| {
                v.status == VideoStatus::Distributed
                    && v.expires_at.is_some_and(|at| at <= reference_time)
            })
            .map(|v| ExpiringVideo {
                id: v.id,
                owner_id: v.owner_id,
                file_path: v.file_path.clone(),
                file_size_bytes: v.file_size_bytes,
                expires_at: v.expires_at,
            })
            .collect();
        due.sort_by_key(|v| v.expires_at);
        Ok(due)
    }

    async fn mark_expired(&self, id: Uuid, owner_id: Uuid, file_size_bytes: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.injected("mark_expired", Some(id))?;

        let is_distributed = state
            .videos
            .get(&id)
            .is_some_and(|v| v.status == VideoStatus::Distributed);
        if !is_distributed {
            return Ok(false);
        }

        // Decrement first so a missing owner leaves the video untouched, like the rolled back transaction.
        state.apply_delta(owner_id, -file_size_bytes)?;
        if let Some(video) = state.videos.get_mut(&id) {
            video.status = VideoStatus::Expired;
            video.updated_at = Utc::now();
        }
        Ok(true)
    }
}

#[async_trait]
impl CheckInStore for MockStore {
    async fn list_check_ins(&self, video_id: Uuid) -> Result<Vec<CheckIn>> {
        let state = self.state.lock().unwrap();
        state.injected("list_check_ins", Some(video_id))?;
        let mut check_ins: Vec<CheckIn> = state
            .check_ins
            .iter()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect();
        check_ins.reverse();
        Ok(check_ins)
    }
}

#[async_trait]
impl UserStore for MockStore {
    async fn get_storage(&self, user_id: Uuid) -> Result<Option<UserStorage>> {
        let state = self.state.lock().unwrap();
        state.injected("get_storage", Some(user_id))?;
        Ok(state.users.get(&user_id).map(|u| u.storage.clone()))
    }

    async fn update_storage_usage(&self, user_id: Uuid, delta_bytes: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.injected("update_storage_usage", Some(user_id))?;
        state.apply_delta(user_id, delta_bytes)
    }

    async fn set_push_token(&self, user_id: Uuid, push_token: Option<String>) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.injected("set_push_token", Some(user_id))?;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.push_token = push_token;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
