//! Video upload.
//!
//! The total size of an upload is only known once the body has been written,
//! so quota is checked twice: once before the transfer with zero candidate
//! bytes, and again with the real size afterwards.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use vigil_core::lifecycle::{next_distribute_at, validate_timer_days};
use vigil_core::models::{NewVideo, Video, VideoCreation};
use vigil_core::AppError;
use vigil_db::VideoStore;
use vigil_storage::{Storage, UploadReader};

use crate::storage_accounting::StorageAccountingService;

const MAX_TITLE_LENGTH: usize = 200;
const PUBLIC_TOKEN_BYTES: usize = 32;

pub struct UploadRequest<'a> {
    pub title: String,
    pub timer_days: Option<i64>,
    pub original_filename: String,
    pub content_type: String,
    pub reader: UploadReader<'a>,
}

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn Storage>,
    videos: Arc<dyn VideoStore>,
    accounting: StorageAccountingService,
    default_timer_days: i64,
    max_timer_days: i64,
    max_upload_size_bytes: i64,
}

/// Opaque token used in public delivery links.
pub fn generate_public_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..PUBLIC_TOKEN_BYTES).map(|_| rng.random()).collect();
    hex::encode(random_bytes)
}

fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "mp4".to_string())
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn Storage>,
        videos: Arc<dyn VideoStore>,
        accounting: StorageAccountingService,
        default_timer_days: i64,
        max_timer_days: i64,
        max_upload_size_bytes: i64,
    ) -> Self {
        Self {
            storage,
            videos,
            accounting,
            default_timer_days,
            max_timer_days,
            max_upload_size_bytes,
        }
    }

    #[tracing::instrument(skip(self, request), fields(title = %request.title))]
    pub async fn upload_video(
        &self,
        owner_id: Uuid,
        request: UploadRequest<'_>,
    ) -> Result<Video, AppError> {
        let title = request.title.trim().to_string();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "title must be between 1 and {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if !request.content_type.starts_with("video/") {
            return Err(AppError::InvalidInput(format!(
                "Unsupported content type: {}",
                request.content_type
            )));
        }
        let timer_days = validate_timer_days(
            request.timer_days.unwrap_or(self.default_timer_days),
            self.max_timer_days,
        )?;

        let pre = self.accounting.check_user_storage_quota(owner_id, 0).await?;
        if !pre.has_quota || pre.remaining_bytes == 0 {
            tracing::warn!(
                owner_id = %owner_id,
                used_bytes = pre.used_bytes,
                quota_bytes = pre.quota_bytes,
                "Upload rejected before transfer: no storage quota left"
            );
            return Err(AppError::QuotaExceeded {
                required: 1,
                remaining: pre.remaining_bytes,
            });
        }

        let video_id = Uuid::new_v4();
        let filename = format!("{}.{}", video_id, file_extension(&request.original_filename));
        let limit = u64::try_from(self.max_upload_size_bytes).unwrap_or(u64::MAX);
        let limited: UploadReader<'_> = Box::pin(request.reader.take(limit.saturating_add(1)));

        let (file_path, written) = self
            .storage
            .upload_stream(owner_id, &filename, limited)
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        if written > limit {
            self.discard(&file_path).await;
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.max_upload_size_bytes
            )));
        }
        let file_size_bytes = written as i64;

        let post = match self
            .accounting
            .check_user_storage_quota(owner_id, file_size_bytes)
            .await
        {
            Ok(post) => post,
            Err(e) => {
                self.discard(&file_path).await;
                return Err(e);
            }
        };
        if !post.has_quota {
            tracing::warn!(
                owner_id = %owner_id,
                file_size_bytes = file_size_bytes,
                remaining_bytes = post.remaining_bytes,
                "Upload rejected after transfer: quota exceeded"
            );
            self.discard(&file_path).await;
            return Err(AppError::QuotaExceeded {
                required: file_size_bytes,
                remaining: post.remaining_bytes,
            });
        }

        let new_video = NewVideo {
            id: video_id,
            owner_id,
            title,
            file_path: file_path.clone(),
            file_size_bytes,
            mime_type: request.content_type,
            distribute_at: next_distribute_at(Utc::now(), timer_days),
            public_token: generate_public_token(),
        };

        match self.videos.create_video(new_video).await {
            Ok(VideoCreation::Created(video)) => Ok(video),
            Ok(VideoCreation::QuotaExceeded {
                used_bytes,
                quota_bytes,
            }) => {
                let remaining = (quota_bytes - used_bytes).max(0);
                tracing::warn!(
                    owner_id = %owner_id,
                    file_size_bytes = file_size_bytes,
                    remaining_bytes = remaining,
                    "Upload rejected at insert: quota used by a concurrent upload"
                );
                self.discard(&file_path).await;
                Err(AppError::QuotaExceeded {
                    required: file_size_bytes,
                    remaining,
                })
            }
            Err(e) => {
                self.discard(&file_path).await;
                Err(AppError::from(e))
            }
        }
    }

    async fn discard(&self, file_path: &str) {
        if let Err(e) = self.storage.delete(file_path).await {
            tracing::error!(
                error = %e,
                file_path = %file_path,
                "Failed to delete rejected upload"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::models::VideoStatus;
    use vigil_db::test_helpers::MockStore;
    use vigil_storage::LocalStorage;

    async fn setup(quota: i64, used: i64, max_upload: i64) -> (MockStore, Arc<LocalStorage>, UploadService, Uuid, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let store = MockStore::new();
        let owner = Uuid::new_v4();
        store.add_user(owner, quota, used);

        let service = UploadService::new(
            storage.clone(),
            Arc::new(store.clone()),
            StorageAccountingService::new(Arc::new(store.clone())),
            30,
            365,
            max_upload,
        );
        (store, storage, service, owner, dir)
    }

    fn request(data: &[u8]) -> UploadRequest<'static> {
        UploadRequest {
            title: "Last words".to_string(),
            timer_days: Some(10),
            original_filename: "final cut.MOV".to_string(),
            content_type: "video/quicktime".to_string(),
            reader: Box::pin(std::io::Cursor::new(data.to_vec())),
        }
    }

    #[tokio::test]
    async fn test_upload_creates_active_video_and_charges_quota() {
        let (store, storage, service, owner, _dir) = setup(10_000, 0, 1_000_000).await;

        let video = service.upload_video(owner, request(&[7u8; 4_000])).await.unwrap();

        assert_eq!(video.status, VideoStatus::Active);
        assert_eq!(video.file_size_bytes, 4_000);
        assert!(video.file_path.ends_with(".mov"));
        assert_eq!(video.public_token.len(), 64);
        assert!(video.distribute_at > video.created_at);
        assert_eq!(store.user_storage(owner).unwrap().storage_used_bytes, 4_000);
        assert!(storage.exists(&video.file_path).await.unwrap());
    }

    #[tokio::test]
    async fn test_upload_rejected_before_transfer_when_quota_full() {
        let (_store, _storage, service, owner, dir) = setup(10_000, 10_000, 1_000_000).await;

        let err = service.upload_video(owner, request(b"abc")).await.unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded { remaining: 0, .. }));
        assert!(!dir.path().join("videos").exists());
    }

    #[tokio::test]
    async fn test_upload_over_remaining_quota_deletes_file() {
        let (store, _storage, service, owner, dir) = setup(10_000, 8_000, 1_000_000).await;

        let err = service
            .upload_video(owner, request(&[1u8; 2_001]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::QuotaExceeded {
                required: 2_001,
                remaining: 2_000
            }
        ));
        assert_eq!(store.user_storage(owner).unwrap().storage_used_bytes, 8_000);
        let owner_dir = dir.path().join("videos").join(owner.to_string());
        assert_eq!(std::fs::read_dir(owner_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_exactly_remaining_quota_succeeds() {
        let (store, _storage, service, owner, _dir) = setup(10_000, 8_000, 1_000_000).await;

        service.upload_video(owner, request(&[1u8; 2_000])).await.unwrap();
        assert_eq!(store.user_storage(owner).unwrap().storage_used_bytes, 10_000);
    }

    #[tokio::test]
    async fn test_upload_loses_race_for_last_quota_bytes() {
        let (store, _storage, service, owner, dir) = setup(1_000, 0, 1_000_000).await;
        store.interleave_upload(owner, 600);

        let err = service
            .upload_video(owner, request(&[1u8; 600]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::QuotaExceeded {
                required: 600,
                remaining: 400
            }
        ));
        assert_eq!(store.user_storage(owner).unwrap().storage_used_bytes, 600);
        let owner_dir = dir.path().join("videos").join(owner.to_string());
        assert_eq!(std::fs::read_dir(owner_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_larger_than_limit_is_rejected() {
        let (store, _storage, service, owner, _dir) = setup(1_000_000, 0, 100).await;

        let err = service.upload_video(owner, request(&[1u8; 101])).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(store.user_storage(owner).unwrap().storage_used_bytes, 0);
    }

    #[tokio::test]
    async fn test_non_video_content_type_is_rejected() {
        let (_store, _storage, service, owner, _dir) = setup(10_000, 0, 1_000).await;
        let mut req = request(b"hello");
        req.content_type = "text/plain".to_string();

        let err = service.upload_video(owner, req).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_public_tokens_are_unique_hex() {
        let a = generate_public_token();
        let b = generate_public_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
