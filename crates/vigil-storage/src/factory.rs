use crate::{LocalStorage, Storage, StorageResult};
use std::sync::Arc;
use vigil_core::Config;

/// Create the storage backend described by `config`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(config.local_storage_path()).await?;
    tracing::info!(
        path = %config.local_storage_path(),
        "Local storage initialized"
    );
    Ok(Arc::new(storage))
}
