//! Storage backends that fail, for exercising error paths.

use async_trait::async_trait;
use uuid::Uuid;
use vigil_storage::{ByteStream, Storage, StorageError, StorageResult, UploadReader};

/// Backend that cannot be reached. With `known_size` set, metadata lookups
/// still answer and only transfers fail.
#[derive(Default)]
pub struct UnavailableStorage {
    pub known_size: Option<u64>,
}

fn unavailable<T>() -> StorageResult<T> {
    Err(StorageError::BackendError(
        "connection refused by 10.0.0.7:9000".to_string(),
    ))
}

#[async_trait]
impl Storage for UnavailableStorage {
    async fn upload_stream<'a>(
        &self,
        _owner_id: Uuid,
        _filename: &str,
        _reader: UploadReader<'a>,
    ) -> StorageResult<(String, u64)> {
        unavailable()
    }

    async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
        unavailable()
    }

    async fn content_length(&self, _storage_key: &str) -> StorageResult<u64> {
        match self.known_size {
            Some(size) => Ok(size),
            None => unavailable(),
        }
    }

    async fn delete(&self, _storage_key: &str) -> StorageResult<()> {
        unavailable()
    }

    async fn download_stream(&self, _storage_key: &str) -> StorageResult<ByteStream> {
        unavailable()
    }

    async fn download_range_stream(
        &self,
        _storage_key: &str,
        _start: u64,
        _end: u64,
    ) -> StorageResult<ByteStream> {
        unavailable()
    }
}
