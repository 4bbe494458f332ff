//! Driving port for project feed and CRUD use-cases.
use async_trait::async_trait;

use crate::domain::{
    Error, FeedPage, FeedQuery, Project, ProjectDetail, ProjectId, ProjectInput, ProjectPatch,
    UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectService: Send + Sync {
    /// One page of public projects, newest first.
    async fn feed(&self, query: FeedQuery) -> Result<FeedPage, Error>;

    async fn create(&self, author: &UserId, input: ProjectInput) -> Result<Project, Error>;

    /// Project with counters; private projects are `not_found` for non-owners.
    async fn detail(&self, id: &ProjectId, viewer: Option<UserId>) -> Result<ProjectDetail, Error>;

    /// Owner-only update; `forbidden` for anyone else.
    async fn update(
        &self,
        id: &ProjectId,
        actor: &UserId,
        patch: ProjectPatch,
    ) -> Result<Project, Error>;

    /// Owner-only delete; `forbidden` for anyone else.
    async fn delete(&self, id: &ProjectId, actor: &UserId) -> Result<(), Error>;

    /// Increment the view counter of a project visible to `viewer` and
    /// return the new total; `not_found` otherwise.
    async fn record_view(&self, id: &ProjectId, viewer: Option<UserId>) -> Result<i64, Error>;

    /// Projects by `author`; private ones only for the author themself.
    async fn by_author(&self, author: &UserId, viewer: Option<UserId>)
    -> Result<Vec<Project>, Error>;
}
