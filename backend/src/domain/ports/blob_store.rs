//! Port for the file store backing `/api/files` and saved fragments.
use async_trait::async_trait;

use crate::domain::{BlobMeta, BlobPath};

use super::define_port_error;

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// The underlying storage failed.
        Io { message: String } => "blob store I/O failed: {message}",
        /// The path refers to a directory or otherwise cannot hold a blob.
        NotAFile { path: String } => "'{path}' is not a file",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` to `path`, creating parent directories.
    async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<BlobMeta, BlobStoreError>;

    /// Read a blob; `None` when absent.
    async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, BlobStoreError>;

    /// Delete a blob; returns `false` when absent.
    async fn delete(&self, path: &BlobPath) -> Result<bool, BlobStoreError>;

    /// All blobs under `prefix`, sorted by path.
    async fn list(&self, prefix: &BlobPath) -> Result<Vec<BlobMeta>, BlobStoreError>;
}
