//! Storage key generation.

use uuid::Uuid;

/// Generate the storage key for a video file owned by `owner_id`.
pub fn generate_storage_key(owner_id: Uuid, filename: &str) -> String {
    format!("videos/{}/{}", owner_id, filename)
}
