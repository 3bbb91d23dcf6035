//! Repository tests against a real PostgreSQL.
//!
//! Requires Docker for testcontainers (Postgres). Each test gets its own
//! container and is skipped when Docker is not reachable.

use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;
use vigil_core::models::{CheckInAction, CheckInOutcome, NewVideo, VideoCreation, VideoStatus};
use vigil_db::{CheckInRepository, UserRepository, VideoRepository};

struct TestDb {
    pool: PgPool,
    _container: ContainerAsync<Postgres>,
}

async fn setup_db() -> Option<TestDb> {
    let container = match Postgres::default().start().await {
        Ok(container) => container,
        Err(e) => {
            eprintln!("Skipping Postgres test, Docker unavailable: {}", e);
            return None;
        }
    };

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get mapped port");
    let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&connection_string)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(TestDb {
        pool,
        _container: container,
    })
}

async fn insert_user(pool: &PgPool, quota_bytes: i64, used_bytes: i64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, storage_quota_bytes, storage_used_bytes) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(quota_bytes)
        .bind(used_bytes)
        .execute(pool)
        .await
        .expect("Failed to insert user");
    id
}

/// Insert a video directly, bypassing quota accounting.
async fn insert_video(pool: &PgPool, owner_id: Uuid, status: VideoStatus, size: i64) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let (distributed_at, expires_at): (Option<DateTime<Utc>>, Option<DateTime<Utc>>) =
        match status {
            VideoStatus::Distributed | VideoStatus::Expired => {
                (Some(now - Duration::days(1)), Some(now + Duration::days(6)))
            }
            VideoStatus::Pending | VideoStatus::Active => (None, None),
        };

    sqlx::query(
        r#"
        INSERT INTO videos (
            id, owner_id, title, file_path, file_size_bytes, mime_type, status,
            distribute_at, distributed_at, expires_at, public_token, created_at
        )
        VALUES ($1, $2, 'clip', $3, $4, 'video/mp4', $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(format!("{}/{}.mp4", owner_id, id))
    .bind(size)
    .bind(status)
    .bind(now - Duration::days(1))
    .bind(distributed_at)
    .bind(expires_at)
    .bind(Uuid::new_v4().simple().to_string())
    .bind(now - Duration::days(40))
    .execute(pool)
    .await
    .expect("Failed to insert video");
    id
}

async fn used_bytes(pool: &PgPool, user_id: Uuid) -> i64 {
    UserRepository::new(pool.clone())
        .get_storage(user_id)
        .await
        .unwrap()
        .unwrap()
        .storage_used_bytes
}

async fn status_of(pool: &PgPool, video_id: Uuid) -> VideoStatus {
    VideoRepository::new(pool.clone())
        .get_video(video_id)
        .await
        .unwrap()
        .unwrap()
        .status
}

fn new_video(owner_id: Uuid, size: i64) -> NewVideo {
    let id = Uuid::new_v4();
    NewVideo {
        id,
        owner_id,
        title: "clip".to_string(),
        file_path: format!("{}/{}.mp4", owner_id, id),
        file_size_bytes: size,
        mime_type: "video/mp4".to_string(),
        distribute_at: Utc::now() + Duration::days(30),
        public_token: Uuid::new_v4().simple().to_string(),
    }
}

#[tokio::test]
async fn test_check_in_updates_video_and_records_audit_row() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1000, 0).await;
    let video_id = insert_video(&db.pool, owner, VideoStatus::Active, 10).await;
    let videos = VideoRepository::new(db.pool.clone());
    let new_deadline = Utc::now() + Duration::days(10);

    let outcome = videos
        .perform_check_in(video_id, CheckInAction::PreventDistribution, Some(new_deadline))
        .await
        .unwrap();

    let CheckInOutcome::Applied { video, check_in } = outcome else {
        panic!("check-in was not applied: {:?}", outcome);
    };
    assert_eq!(video.status, VideoStatus::Active);
    assert_eq!(
        video.distribute_at.timestamp_micros(),
        new_deadline.timestamp_micros()
    );
    assert_eq!(check_in.video_id, video_id);

    let history = CheckInRepository::new(db.pool.clone())
        .list_for_video(video_id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, check_in.id);
    assert_eq!(history[0].action, CheckInAction::PreventDistribution);
}

#[tokio::test]
async fn test_check_in_on_distributed_video_writes_nothing() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1000, 10).await;
    let video_id = insert_video(&db.pool, owner, VideoStatus::Distributed, 10).await;

    let outcome = VideoRepository::new(db.pool.clone())
        .perform_check_in(video_id, CheckInAction::AllowDistribution, None)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        CheckInOutcome::InvalidState(VideoStatus::Distributed)
    ));
    let history = CheckInRepository::new(db.pool.clone())
        .list_for_video(video_id)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_mark_distributed_only_moves_active_videos() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1000, 0).await;
    let active = insert_video(&db.pool, owner, VideoStatus::Active, 10).await;
    let expired = insert_video(&db.pool, owner, VideoStatus::Expired, 10).await;
    let videos = VideoRepository::new(db.pool.clone());
    let now = Utc::now();
    let expires_at = now + Duration::days(7);

    assert!(videos.mark_distributed(active, now, expires_at).await.unwrap());
    assert_eq!(status_of(&db.pool, active).await, VideoStatus::Distributed);

    // A second sweep over the same row is a no-op.
    assert!(!videos.mark_distributed(active, now, expires_at).await.unwrap());
    assert!(!videos.mark_distributed(expired, now, expires_at).await.unwrap());
    assert_eq!(status_of(&db.pool, expired).await, VideoStatus::Expired);
}

#[tokio::test]
async fn test_mark_expired_releases_bytes() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1000, 300).await;
    let video_id = insert_video(&db.pool, owner, VideoStatus::Distributed, 120).await;
    let videos = VideoRepository::new(db.pool.clone());

    assert!(videos.mark_expired(video_id, owner, 120).await.unwrap());
    assert_eq!(status_of(&db.pool, video_id).await, VideoStatus::Expired);
    assert_eq!(used_bytes(&db.pool, owner).await, 180);

    assert!(!videos.mark_expired(video_id, owner, 120).await.unwrap());
    assert_eq!(used_bytes(&db.pool, owner).await, 180);
}

#[tokio::test]
async fn test_mark_expired_rolls_back_when_release_fails() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1000, 300).await;
    let video_id = insert_video(&db.pool, owner, VideoStatus::Distributed, 120).await;
    let videos = VideoRepository::new(db.pool.clone());

    // No such user, so the decrement fails after the status update.
    let result = videos.mark_expired(video_id, Uuid::new_v4(), 120).await;

    assert!(result.is_err());
    assert_eq!(status_of(&db.pool, video_id).await, VideoStatus::Distributed);
    assert_eq!(used_bytes(&db.pool, owner).await, 300);
}

#[tokio::test]
async fn test_concurrent_usage_updates_sum_exactly() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1_000_000, 0).await;
    let users = UserRepository::new(db.pool.clone());

    let updates = (1..=20).map(|i| {
        let users = users.clone();
        async move {
            let delta = if i % 4 == 0 { -i } else { i * 10 };
            users.update_storage_usage(owner, delta).await
        }
    });
    for result in futures::future::join_all(updates).await {
        result.unwrap();
    }

    let expected: i64 = (1..=20).map(|i| if i % 4 == 0 { -i } else { i * 10 }).sum();
    assert_eq!(used_bytes(&db.pool, owner).await, expected);
}

#[tokio::test]
async fn test_concurrent_uploads_cannot_overshoot_quota() {
    let Some(db) = setup_db().await else { return };
    let owner = insert_user(&db.pool, 1000, 0).await;
    let videos = VideoRepository::new(db.pool.clone());

    let attempts = (0..8).map(|_| {
        let videos = videos.clone();
        async move { videos.create_video(&new_video(owner, 600)).await }
    });
    let outcomes = futures::future::join_all(attempts).await;

    let mut created = 0;
    for outcome in outcomes {
        match outcome.unwrap() {
            VideoCreation::Created(video) => {
                assert_eq!(video.status, VideoStatus::Active);
                created += 1;
            }
            VideoCreation::QuotaExceeded {
                used_bytes,
                quota_bytes,
            } => {
                assert_eq!(used_bytes, 600);
                assert_eq!(quota_bytes, 1000);
            }
        }
    }
    assert_eq!(created, 1);
    assert_eq!(used_bytes(&db.pool, owner).await, 600);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE owner_id = $1")
        .bind(owner)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}
