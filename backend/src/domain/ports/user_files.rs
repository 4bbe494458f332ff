//! Driving port for the per-user file manager.
use async_trait::async_trait;

use crate::domain::{BlobMeta, Error, StoredFile, UserId};

/// File operations scoped to `users/<user_id>/`. Paths are relative to that
/// root on the way in and on the way out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserFiles: Send + Sync {
    async fn list(&self, user: &UserId, prefix: Option<String>) -> Result<Vec<BlobMeta>, Error>;

    async fn put(&self, user: &UserId, path: &str, bytes: Vec<u8>) -> Result<BlobMeta, Error>;

    async fn get(&self, user: &UserId, path: &str) -> Result<StoredFile, Error>;

    async fn delete(&self, user: &UserId, path: &str) -> Result<(), Error>;
}
