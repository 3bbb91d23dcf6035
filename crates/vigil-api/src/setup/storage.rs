//! Storage setup and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use vigil_core::Config;
use vigil_storage::{create_storage, Storage};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!("Storage initialized successfully");
    Ok(storage)
}
