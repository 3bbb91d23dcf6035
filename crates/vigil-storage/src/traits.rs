//! Storage abstraction trait

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid byte range {start}-{end} for {size} byte file")]
    InvalidRange { start: u64, end: u64, size: u64 },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageError::NotFound(_) => true,
            StorageError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of file chunks. Dropping it closes the underlying file handle.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Upload body. May borrow from the request it is read from.
pub type UploadReader<'a> = Pin<Box<dyn AsyncRead + Send + Unpin + 'a>>;

/// File store used by upload, delivery and expiration.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `reader` to a new key for `owner_id` and return `(storage_key, bytes_written)`.
    ///
    /// The reader is consumed until EOF; the total size is only known afterwards.
    async fn upload_stream<'a>(
        &self,
        owner_id: Uuid,
        filename: &str,
        reader: UploadReader<'a>,
    ) -> StorageResult<(String, u64)>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Size in bytes of a stored file.
    async fn content_length(&self, storage_key: &str) -> StorageResult<u64>;

    /// Delete a file. Fails with [`StorageError::NotFound`] when it is already gone.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Stream the whole file.
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Stream exactly the bytes `start..=end` of a file.
    async fn download_range_stream(
        &self,
        storage_key: &str,
        start: u64,
        end: u64,
    ) -> StorageResult<ByteStream>;
}
