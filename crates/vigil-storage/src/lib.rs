//! Vigil Storage Library
//!
//! File store abstraction for uploaded videos. The [`Storage`] trait exposes the
//! operations the lifecycle needs (streamed write, existence check, size stat,
//! delete, byte-range read) and [`LocalStorage`] implements it on the local
//! filesystem.
//!
//! # Storage key format
//!
//! Keys are owner-scoped: `videos/{owner_id}/{filename}`. Keys must not contain
//! `..` or a leading `/`.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, UploadReader};
