//! Test helpers: build the router over in-memory stores and local storage.
//!
//! Run with `cargo test -p vigil-api`. No database is needed.

pub mod storage;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;
use vigil_api::auth::JwtClaims;
use vigil_api::setup::routes::setup_routes;
use vigil_api::state::{AppState, Stores};
use vigil_core::models::{Video, VideoStatus};
use vigil_core::Config;
use vigil_db::test_helpers::{video_fixture, MockStore};
use vigil_storage::{LocalStorage, Storage};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-with-32-plus-chars";

pub struct TestApp {
    pub server: TestServer,
    pub store: MockStore,
    pub storage: Arc<LocalStorage>,
    pub user_id: Uuid,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// `Authorization` header value for the default test user.
    pub fn auth(&self) -> String {
        bearer(self.user_id)
    }

    /// Store `body` as a file and register a video in `status` pointing at it.
    pub async fn add_video(&self, status: VideoStatus, body: &[u8], title: &str) -> Video {
        let (key, size) = self
            .storage
            .upload_stream(
                self.user_id,
                &format!("{}.mp4", Uuid::new_v4()),
                Box::pin(std::io::Cursor::new(body.to_vec())),
            )
            .await
            .expect("Failed to store test video");

        let mut video = video_fixture(self.user_id, status, size as i64);
        video.file_path = key;
        video.title = title.to_string();
        video.mime_type = "video/mp4".to_string();
        self.store.add_video(video.clone());
        video
    }
}

pub fn test_config(storage_path: &str) -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: "postgresql://unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        local_storage_path: storage_path.to_string(),
        max_upload_size_bytes: 1024 * 1024,
        retention_days: 7,
        default_timer_days: 30,
        max_timer_days: 365,
        push_enabled: false,
        push_api_url: "http://localhost/push".to_string(),
        push_access_token: None,
        jobs_enabled: false,
        jobs_run_on_start: false,
    }
}

pub fn bearer(user_id: Uuid) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(1)).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token");
    format!("Bearer {}", token)
}

/// Knobs for [`setup_test_app_with`].
pub struct TestOptions {
    pub quota_bytes: i64,
    pub environment: &'static str,
    /// Storage the router uses instead of the temp-dir `LocalStorage`.
    pub storage: Option<Arc<dyn Storage>>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            quota_bytes: 10 * 1024 * 1024,
            environment: "test",
            storage: None,
        }
    }
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage = Arc::new(
        LocalStorage::new(temp_dir.path())
            .await
            .expect("Failed to create local storage"),
    );

    let store = MockStore::new();
    let user_id = Uuid::new_v4();
    store.add_user(user_id, options.quota_bytes, 0);

    let stores = Stores {
        videos: Arc::new(store.clone()),
        check_ins: Arc::new(store.clone()),
        users: Arc::new(store.clone()),
    };
    let mut config = test_config(&temp_dir.path().to_string_lossy());
    config.environment = options.environment.to_string();
    let router_storage = options
        .storage
        .unwrap_or_else(|| storage.clone() as Arc<dyn Storage>);
    let state = Arc::new(AppState::new(config, None, stores, router_storage));

    let router = setup_routes(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        store,
        storage,
        user_id,
        _temp_dir: temp_dir,
    }
}

/// Test app with one user holding `quota_bytes` of quota.
pub async fn setup_test_app_with_quota(quota_bytes: i64) -> TestApp {
    setup_test_app_with(TestOptions {
        quota_bytes,
        ..TestOptions::default()
    })
    .await
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}
