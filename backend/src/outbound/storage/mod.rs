//! Filesystem blob store confined to a root directory with `cap-std`.
//!
//! Every operation resolves paths relative to the opened root [`Dir`], so
//! validated [`BlobPath`]s can never escape it. Filesystem calls are
//! blocking and run on tokio's blocking pool.

use std::io::{self, ErrorKind};
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::{Dir, Metadata};
use sha2::{Digest, Sha256};

use crate::domain::ports::{BlobStore, BlobStoreError};
use crate::domain::{BlobMeta, BlobPath};

/// Blob store rooted at a directory on local disk.
#[derive(Clone)]
pub struct CapStdBlobStore {
    root: Arc<Dir>,
}

impl CapStdBlobStore {
    /// Open (creating when missing) the root directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be created
    /// or opened.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self {
            root: Arc::new(dir),
        })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, BlobStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, BlobStoreError> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || op(&root))
            .await
            .map_err(|err| BlobStoreError::io(format!("blob task failed: {err}")))?
    }
}

/// ETag derived from the file size and modification time.
///
/// Listing never reads file contents, so any rewrite that changes either
/// value yields a new tag.
fn metadata_etag(meta: &Metadata) -> String {
    let modified = meta
        .modified()
        .ok()
        .and_then(|time| time.into_std().duration_since(UNIX_EPOCH).ok())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(meta.len().to_be_bytes());
    hasher.update(modified.as_secs().to_be_bytes());
    hasher.update(modified.subsec_nanos().to_be_bytes());
    hex::encode(hasher.finalize())
}

fn blob_meta(dir: &Dir, path: BlobPath) -> Result<BlobMeta, BlobStoreError> {
    let meta = dir
        .metadata(path.as_str())
        .map_err(|err| io_error(&path, &err))?;
    Ok(BlobMeta {
        size: meta.len(),
        etag: metadata_etag(&meta),
        path,
    })
}

fn io_error(path: &BlobPath, err: &io::Error) -> BlobStoreError {
    BlobStoreError::io(format!("{path}: {err}"))
}

fn parent(path: &BlobPath) -> Option<&str> {
    path.as_str().rsplit_once('/').map(|(parent, _)| parent)
}

fn ensure_not_dir(dir: &Dir, path: &BlobPath) -> Result<(), BlobStoreError> {
    match dir.metadata(path.as_str()) {
        Ok(meta) if meta.is_dir() => Err(BlobStoreError::not_a_file(path.as_str())),
        _ => Ok(()),
    }
}

fn collect_files(
    dir: &Dir,
    prefix: &BlobPath,
    out: &mut Vec<BlobMeta>,
) -> Result<(), BlobStoreError> {
    let entries = dir
        .read_dir(prefix.as_str())
        .map_err(|err| io_error(prefix, &err))?;
    for entry in entries {
        let entry = entry.map_err(|err| io_error(prefix, &err))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Ok(path) = prefix.join(name) else {
            continue;
        };
        let file_type = entry.file_type().map_err(|err| io_error(&path, &err))?;
        if file_type.is_dir() {
            collect_files(dir, &path, out)?;
        } else if file_type.is_file() {
            out.push(blob_meta(dir, path)?);
        }
    }
    Ok(())
}

#[async_trait]
impl BlobStore for CapStdBlobStore {
    async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<BlobMeta, BlobStoreError> {
        let path = path.clone();
        self.blocking(move |dir| {
            ensure_not_dir(dir, &path)?;
            if let Some(parent) = parent(&path) {
                dir.create_dir_all(parent)
                    .map_err(|err| io_error(&path, &err))?;
            }
            dir.write(path.as_str(), &bytes)
                .map_err(|err| io_error(&path, &err))?;
            blob_meta(dir, path)
        })
        .await
    }

    async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>, BlobStoreError> {
        let path = path.clone();
        self.blocking(move |dir| {
            ensure_not_dir(dir, &path)?;
            match dir.read(path.as_str()) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(io_error(&path, &err)),
            }
        })
        .await
    }

    async fn delete(&self, path: &BlobPath) -> Result<bool, BlobStoreError> {
        let path = path.clone();
        self.blocking(move |dir| {
            ensure_not_dir(dir, &path)?;
            match dir.remove_file(path.as_str()) {
                Ok(()) => Ok(true),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
                Err(err) => Err(io_error(&path, &err)),
            }
        })
        .await
    }

    async fn list(&self, prefix: &BlobPath) -> Result<Vec<BlobMeta>, BlobStoreError> {
        let prefix = prefix.clone();
        self.blocking(move |dir| {
            match dir.metadata(prefix.as_str()) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => return Err(BlobStoreError::io(format!("{prefix}: not a directory"))),
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(err) => return Err(io_error(&prefix, &err)),
            }
            let mut files = Vec::new();
            collect_files(dir, &prefix, &mut files)?;
            files.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(files)
        })
        .await
    }
}
