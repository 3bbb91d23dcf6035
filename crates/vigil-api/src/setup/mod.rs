//! Application setup and initialization

pub mod database;
pub mod jobs;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use vigil_core::Config;
use vigil_infra::JobScheduler;

use crate::state::AppState;

/// Everything `start_server` needs.
pub struct App {
    pub router: Router,
    /// `None` when background jobs are disabled.
    pub scheduler: Option<JobScheduler>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    config.validate().context("Configuration validation failed")?;

    vigil_infra::init_telemetry(&config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    let storage = storage::setup_storage(&config).await?;

    let stores = services::repositories(&pool);

    let scheduler = jobs::start_jobs(&config, &stores, storage.clone())?;

    let state = Arc::new(AppState::new(config, Some(pool), stores, storage));

    let router = routes::setup_routes(state)?;

    Ok(App {
        router,
        scheduler,
    })
}
