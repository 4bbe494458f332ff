//! Port for social edges: likes, favorites, comments, follows, shares and
//! notifications.
//!
//! Mutations that touch more than one table (like toggles with their
//! counter, comments with their notifications) must be atomic in adapters.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentId, FollowCounts, LikeOutcome, NewComment, NewNotification, Notification,
    Project, ProjectId, SharePlatform, UserId, ViewerState,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by social repository adapters.
    pub enum SocialPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "social repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "social repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialRepository: Send + Sync {
    /// Flip the like edge and adjust the project's counter in one step.
    async fn toggle_like(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<LikeOutcome, SocialPersistenceError>;

    /// Whether `user` liked or favorited `project`.
    async fn viewer_state(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<ViewerState, SocialPersistenceError>;

    /// Flip the favorite edge; returns the new state.
    async fn toggle_favorite(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<bool, SocialPersistenceError>;

    /// Projects favorited by `user`, most recent first.
    async fn list_favorites(&self, user: &UserId) -> Result<Vec<Project>, SocialPersistenceError>;

    /// Insert a comment together with the notifications it triggers.
    async fn add_comment(
        &self,
        comment: &NewComment,
        notifications: &[NewNotification],
    ) -> Result<Comment, SocialPersistenceError>;

    async fn find_comment(&self, id: &CommentId) -> Result<Option<Comment>, SocialPersistenceError>;

    /// All comments on a project in creation order.
    async fn list_comments(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Comment>, SocialPersistenceError>;

    /// Delete a comment and its replies; returns `false` when it did not exist.
    async fn delete_comment(&self, id: &CommentId) -> Result<bool, SocialPersistenceError>;

    async fn count_comments(&self, project: &ProjectId) -> Result<i64, SocialPersistenceError>;

    /// Flip the follow edge; returns the new state.
    async fn toggle_follow(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialPersistenceError>;

    async fn follow_counts(&self, user: &UserId) -> Result<FollowCounts, SocialPersistenceError>;

    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialPersistenceError>;

    /// Record a share and return the project's share total.
    async fn record_share(
        &self,
        project: &ProjectId,
        user: Option<UserId>,
        platform: SharePlatform,
    ) -> Result<i64, SocialPersistenceError>;

    async fn count_shares(&self, project: &ProjectId) -> Result<i64, SocialPersistenceError>;

    async fn notify(&self, notification: &NewNotification) -> Result<(), SocialPersistenceError>;

    /// Notifications for `user`, newest first.
    async fn list_notifications(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, SocialPersistenceError>;

    /// Mark the given notifications (or all when `ids` is `None`) as read.
    async fn mark_notifications_read(
        &self,
        user: &UserId,
        ids: Option<Vec<Uuid>>,
    ) -> Result<u64, SocialPersistenceError>;
}
