//! Port for project persistence.
//!
//! Besides CRUD the repository exposes the selection queries used by the
//! recommendation service (newest, most viewed, keyword search, random).

use async_trait::async_trait;

use crate::domain::{FeedQuery, Project, ProjectDraft, ProjectId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by project repository adapters.
    pub enum ProjectPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "project repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "project repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persist a new project authored by `author`.
    async fn create(
        &self,
        id: &ProjectId,
        author: Option<UserId>,
        draft: &ProjectDraft,
    ) -> Result<Project, ProjectPersistenceError>;

    async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, ProjectPersistenceError>;

    /// Replace the editable fields of a project.
    async fn update(
        &self,
        id: &ProjectId,
        draft: &ProjectDraft,
    ) -> Result<Option<Project>, ProjectPersistenceError>;

    /// Delete a project; returns `false` when it did not exist.
    async fn delete(&self, id: &ProjectId) -> Result<bool, ProjectPersistenceError>;

    /// Public projects, newest first. Returns at most `query.limit + 1` rows
    /// so callers can tell whether another page exists.
    async fn list_public(&self, query: &FeedQuery) -> Result<Vec<Project>, ProjectPersistenceError>;

    /// Projects by `author`, newest first; private ones only when requested.
    async fn list_by_author(
        &self,
        author: &UserId,
        include_private: bool,
    ) -> Result<Vec<Project>, ProjectPersistenceError>;

    /// Number of public projects authored by `author`.
    async fn count_by_author(&self, author: &UserId) -> Result<i64, ProjectPersistenceError>;

    /// Atomically increment the view counter, returning the new value.
    async fn increment_views(&self, id: &ProjectId) -> Result<Option<i64>, ProjectPersistenceError>;

    /// Most recently created public project other than `exclude`.
    async fn newest_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError>;

    /// Public project with the highest view count other than `exclude`.
    async fn most_viewed_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError>;

    /// Public projects whose title or description contains `keyword`,
    /// case-insensitively, other than `exclude`.
    async fn search_public(
        &self,
        keyword: &str,
        exclude: &ProjectId,
        limit: u32,
    ) -> Result<Vec<Project>, ProjectPersistenceError>;

    /// A random public project other than `exclude`.
    async fn random_public(
        &self,
        exclude: &ProjectId,
    ) -> Result<Option<Project>, ProjectPersistenceError>;

    /// Up to `limit` random public project ids.
    async fn sample_public_ids(&self, limit: u32) -> Result<Vec<ProjectId>, ProjectPersistenceError>;
}
