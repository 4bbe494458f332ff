//! Per-user file manager over the blob store.
//!
//! Every operation is confined to `users/<user_id>/`; callers pass paths
//! relative to that root and receive relative paths back.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{BlobStore, UserFiles};
use crate::domain::service_errors::map_blob_error;
use crate::domain::{BlobMeta, BlobPath, BlobPathError, Error, StoredFile, UserId};

fn path_error(err: BlobPathError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({ "field": "path" }))
}

/// File service implementing [`UserFiles`].
#[derive(Clone)]
pub struct FilesService<B> {
    blobs: Arc<B>,
}

impl<B> FilesService<B> {
    pub fn new(blobs: Arc<B>) -> Self {
        Self { blobs }
    }
}

impl<B> FilesService<B>
where
    B: BlobStore,
{
    fn resolve(user: &UserId, relative: &str) -> Result<BlobPath, Error> {
        BlobPath::user_root(user)
            .join(relative.trim_matches('/'))
            .map_err(path_error)
    }

    /// Rewrite an absolute blob path relative to the user's root.
    fn relative(user: &UserId, meta: BlobMeta) -> Result<BlobMeta, Error> {
        let root = BlobPath::user_root(user);
        let relative = meta
            .path
            .strip_prefix(&root)
            .ok_or_else(|| Error::internal("blob listed outside the user root"))?;
        Ok(BlobMeta {
            path: BlobPath::new(relative).map_err(path_error)?,
            ..meta
        })
    }
}

#[async_trait]
impl<B> UserFiles for FilesService<B>
where
    B: BlobStore,
{
    async fn list(&self, user: &UserId, prefix: Option<String>) -> Result<Vec<BlobMeta>, Error> {
        let scope = match prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => Self::resolve(user, prefix)?,
            _ => BlobPath::user_root(user),
        };
        self.blobs
            .list(&scope)
            .await
            .map_err(map_blob_error)?
            .into_iter()
            .map(|meta| Self::relative(user, meta))
            .collect()
    }

    async fn put(&self, user: &UserId, path: &str, bytes: Vec<u8>) -> Result<BlobMeta, Error> {
        let target = Self::resolve(user, path)?;
        let meta = self
            .blobs
            .put(&target, bytes)
            .await
            .map_err(map_blob_error)?;
        info!(path = %meta.path, size = meta.size, "file stored");
        Self::relative(user, meta)
    }

    async fn get(&self, user: &UserId, path: &str) -> Result<StoredFile, Error> {
        let target = Self::resolve(user, path)?;
        let bytes = self
            .blobs
            .get(&target)
            .await
            .map_err(map_blob_error)?
            .ok_or_else(|| Error::not_found("file not found"))?;
        let relative = target
            .strip_prefix(&BlobPath::user_root(user))
            .ok_or_else(|| Error::internal("blob outside the user root"))?;
        Ok(StoredFile {
            path: BlobPath::new(relative).map_err(path_error)?,
            bytes,
        })
    }

    async fn delete(&self, user: &UserId, path: &str) -> Result<(), Error> {
        let target = Self::resolve(user, path)?;
        if !self.blobs.delete(&target).await.map_err(map_blob_error)? {
            return Err(Error::not_found("file not found"));
        }
        info!(path = %target, "file deleted");
        Ok(())
    }
}
