//! Shared fixtures for unit tests.

use std::sync::Arc;
use vigil_core::Config;
use vigil_db::test_helpers::MockStore;
use vigil_storage::Storage;

use crate::state::{AppState, Stores};

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: "postgresql://unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        jwt_secret: "x".repeat(32),
        local_storage_path: "./unused".to_string(),
        max_upload_size_bytes: 1024,
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

pub fn stores(store: &MockStore) -> Stores {
    Stores {
        videos: Arc::new(store.clone()),
        check_ins: Arc::new(store.clone()),
        users: Arc::new(store.clone()),
    }
}

/// App state over `store` and `storage`, without a database pool.
pub fn test_state(store: &MockStore, storage: Arc<dyn Storage>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), None, stores(store), storage))
}
