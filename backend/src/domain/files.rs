//! Blob paths and metadata for the per-user file store.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Maximum length of a caller-supplied path, excluding the user root.
pub const PATH_MAX: usize = 512;
/// Default upload size limit (5 MiB).
pub const DEFAULT_UPLOAD_LIMIT: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobPathError {
    #[error("path must not be empty")]
    Empty,
    #[error("path must be at most {max} characters")]
    TooLong { max: usize },
    #[error("path must be relative without '.', '..' or empty segments")]
    Invalid,
}

/// Validated relative path inside the blob store.
///
/// ## Invariants
/// - non-empty; paths built by [`BlobPath::new`] hold at most [`PATH_MAX`]
///   characters, joined paths may exceed it by their prefix;
/// - no leading `/`, no backslashes or control characters;
/// - no empty, `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobPath(String);

impl BlobPath {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BlobPathError> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(BlobPathError::Empty);
        }
        if raw.chars().count() > PATH_MAX {
            return Err(BlobPathError::TooLong { max: PATH_MAX });
        }
        let valid = !raw.starts_with('/')
            && !raw.contains('\\')
            && !raw.chars().any(char::is_control)
            && raw
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !valid {
            return Err(BlobPathError::Invalid);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Root directory owned by `user`.
    pub fn user_root(user: &UserId) -> Self {
        Self(format!("users/{user}"))
    }

    /// Location of a saved generation result.
    pub fn fragment_file(
        user: &UserId,
        fragment: &Uuid,
        file_name: &str,
    ) -> Result<Self, BlobPathError> {
        Self::user_root(user).join(&format!("fragments/{fragment}/{file_name}"))
    }

    /// Append a validated relative path.
    ///
    /// Only `relative` is held to [`PATH_MAX`]; the receiver is already valid.
    pub fn join(&self, relative: &str) -> Result<Self, BlobPathError> {
        let tail = Self::new(relative)?;
        Ok(Self(format!("{}/{}", self.0, tail.0)))
    }

    /// Strip `prefix/` from the front when present.
    pub fn strip_prefix(&self, prefix: &BlobPath) -> Option<&str> {
        self.0
            .strip_prefix(prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(self.0.as_str())
    }

    /// Guess a MIME type from the file extension.
    pub fn content_type(&self) -> &'static str {
        let extension = self
            .file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("html" | "htm") => "text/html; charset=utf-8",
            Some("css") => "text/css; charset=utf-8",
            Some("js" | "mjs" | "jsx") => "text/javascript; charset=utf-8",
            Some("ts" | "tsx" | "vue" | "py" | "md" | "txt") => "text/plain; charset=utf-8",
            Some("json") => "application/json",
            Some("svg") => "image/svg+xml",
            Some("png") => "image/png",
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BlobPath> for String {
    fn from(value: BlobPath) -> Self {
        value.0
    }
}

impl TryFrom<String> for BlobPath {
    type Error = BlobPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Metadata describing a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMeta {
    pub path: BlobPath,
    pub size: u64,
    pub etag: String,
}

/// Blob contents returned to a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: BlobPath,
    pub bytes: Vec<u8>,
}
