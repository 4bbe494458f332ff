//! Driving port for social interactions.
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentBody, CommentId, CommentThread, Error, LikeOutcome, Notification, Project,
    ProjectId, SharePlatform, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialService: Send + Sync {
    async fn toggle_like(&self, user: &UserId, project: &ProjectId) -> Result<LikeOutcome, Error>;

    async fn toggle_favorite(&self, user: &UserId, project: &ProjectId) -> Result<bool, Error>;

    async fn favorites(&self, user: &UserId) -> Result<Vec<Project>, Error>;

    /// Threaded comments of a project visible to `viewer`.
    async fn comments(
        &self,
        project: &ProjectId,
        viewer: Option<UserId>,
    ) -> Result<Vec<CommentThread>, Error>;

    /// Add a comment or reply; notifies the project owner and parent author.
    async fn add_comment(
        &self,
        author: &UserId,
        project: &ProjectId,
        content: CommentBody,
        parent: Option<CommentId>,
    ) -> Result<Comment, Error>;

    /// Author-only delete; `forbidden` for anyone else.
    async fn delete_comment(&self, actor: &UserId, id: &CommentId) -> Result<(), Error>;

    /// Follow or unfollow; self-follow is `invalid_request`.
    async fn toggle_follow(&self, follower: &UserId, following: &UserId) -> Result<bool, Error>;

    /// Record a share and return the project's share total.
    async fn share(
        &self,
        project: &ProjectId,
        user: Option<UserId>,
        platform: SharePlatform,
    ) -> Result<i64, Error>;

    async fn notifications(&self, user: &UserId, unread_only: bool)
    -> Result<Vec<Notification>, Error>;

    /// Mark notifications read; `None` marks all.
    async fn mark_read(&self, user: &UserId, ids: Option<Vec<Uuid>>) -> Result<u64, Error>;
}
