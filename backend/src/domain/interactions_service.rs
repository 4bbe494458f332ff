//! Social interactions service: likes, favorites, comments, follows, shares
//! and notifications.
//!
//! Notifications go to the project owner on like-on and comment, to the
//! parent author on reply and to the followed user on follow. Self-actions
//! never notify.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    ProjectRepository, SocialRepository, SocialService, UserRepository,
};
use crate::domain::service_errors::{map_project_error, map_social_error, map_user_error};
use crate::domain::{
    Comment, CommentBody, CommentId, CommentThread, Error, LikeOutcome, NewComment,
    NewNotification, Notification, NotificationKind, Project, ProjectId, SharePlatform, UserId,
    build_threads,
};

/// Social service implementing [`SocialService`].
#[derive(Clone)]
pub struct InteractionsService<U, P, S> {
    users: Arc<U>,
    projects: Arc<P>,
    social: Arc<S>,
}

impl<U, P, S> InteractionsService<U, P, S> {
    pub fn new(users: Arc<U>, projects: Arc<P>, social: Arc<S>) -> Self {
        Self {
            users,
            projects,
            social,
        }
    }
}

impl<U, P, S> InteractionsService<U, P, S>
where
    U: UserRepository,
    P: ProjectRepository,
    S: SocialRepository,
{
    async fn visible_project(
        &self,
        id: &ProjectId,
        viewer: Option<&UserId>,
    ) -> Result<Project, Error> {
        self.projects
            .find_by_id(id)
            .await
            .map_err(map_project_error)?
            .filter(|project| project.is_visible_to(viewer))
            .ok_or_else(|| Error::not_found("project not found"))
    }

    async fn notify(&self, notification: Option<NewNotification>) {
        let Some(notification) = notification else {
            return;
        };
        // Best effort.
        if let Err(err) = self.social.notify(&notification).await {
            warn!(error = %err, kind = notification.kind.as_str(), "failed to record notification");
        }
    }
}

#[async_trait]
impl<U, P, S> SocialService for InteractionsService<U, P, S>
where
    U: UserRepository,
    P: ProjectRepository,
    S: SocialRepository,
{
    async fn toggle_like(&self, user: &UserId, project: &ProjectId) -> Result<LikeOutcome, Error> {
        let target = self.visible_project(project, Some(user)).await?;
        let outcome = self
            .social
            .toggle_like(user, project)
            .await
            .map_err(map_social_error)?;
        if outcome.liked {
            if let Some(owner) = &target.author_id {
                self.notify(NewNotification::unless_self(
                    owner,
                    user,
                    NotificationKind::Like,
                    *project.as_uuid(),
                ))
                .await;
            }
        }
        Ok(outcome)
    }

    async fn toggle_favorite(&self, user: &UserId, project: &ProjectId) -> Result<bool, Error> {
        self.visible_project(project, Some(user)).await?;
        self.social
            .toggle_favorite(user, project)
            .await
            .map_err(map_social_error)
    }

    async fn favorites(&self, user: &UserId) -> Result<Vec<Project>, Error> {
        let projects = self
            .social
            .list_favorites(user)
            .await
            .map_err(map_social_error)?;
        Ok(projects
            .into_iter()
            .filter(|project| project.is_visible_to(Some(user)))
            .collect())
    }

    async fn comments(
        &self,
        project: &ProjectId,
        viewer: Option<UserId>,
    ) -> Result<Vec<CommentThread>, Error> {
        self.visible_project(project, viewer.as_ref()).await?;
        let comments = self
            .social
            .list_comments(project)
            .await
            .map_err(map_social_error)?;
        Ok(build_threads(comments))
    }

    async fn add_comment(
        &self,
        author: &UserId,
        project: &ProjectId,
        content: CommentBody,
        parent: Option<CommentId>,
    ) -> Result<Comment, Error> {
        let target = self.visible_project(project, Some(author)).await?;

        let mut notifications = Vec::new();
        if let Some(parent_id) = parent {
            let parent_comment = self
                .social
                .find_comment(&parent_id)
                .await
                .map_err(map_social_error)?
                .filter(|comment| comment.project_id == *project)
                .ok_or_else(|| Error::invalid_request("parent comment does not belong to this project"))?;
            notifications.extend(NewNotification::unless_self(
                &parent_comment.author.id,
                author,
                NotificationKind::Reply,
                *project.as_uuid(),
            ));
        }
        if let Some(owner) = &target.author_id {
            let already_notified = notifications
                .iter()
                .any(|n: &NewNotification| &n.recipient_id == owner);
            if !already_notified {
                notifications.extend(NewNotification::unless_self(
                    owner,
                    author,
                    NotificationKind::Comment,
                    *project.as_uuid(),
                ));
            }
        }

        let comment = NewComment {
            id: CommentId::random(),
            project_id: *project,
            author_id: author.clone(),
            parent_id: parent,
            content,
        };
        let stored = self
            .social
            .add_comment(&comment, &notifications)
            .await
            .map_err(map_social_error)?;
        info!(comment_id = %stored.id, project_id = %project, "comment added");
        Ok(stored)
    }

    async fn delete_comment(&self, actor: &UserId, id: &CommentId) -> Result<(), Error> {
        let comment = self
            .social
            .find_comment(id)
            .await
            .map_err(map_social_error)?
            .ok_or_else(|| Error::not_found("comment not found"))?;
        if &comment.author.id != actor {
            return Err(Error::forbidden("only the author may delete this comment"));
        }
        if !self.social.delete_comment(id).await.map_err(map_social_error)? {
            return Err(Error::not_found("comment not found"));
        }
        Ok(())
    }

    async fn toggle_follow(&self, follower: &UserId, following: &UserId) -> Result<bool, Error> {
        if follower == following {
            return Err(Error::invalid_request("you cannot follow yourself"));
        }
        self.users
            .find_by_id(following)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;
        let now_following = self
            .social
            .toggle_follow(follower, following)
            .await
            .map_err(map_social_error)?;
        if now_following {
            self.notify(NewNotification::unless_self(
                following,
                follower,
                NotificationKind::Follow,
                *follower.as_uuid(),
            ))
            .await;
        }
        Ok(now_following)
    }

    async fn share(
        &self,
        project: &ProjectId,
        user: Option<UserId>,
        platform: SharePlatform,
    ) -> Result<i64, Error> {
        self.visible_project(project, user.as_ref()).await?;
        self.social
            .record_share(project, user, platform)
            .await
            .map_err(map_social_error)
    }

    async fn notifications(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, Error> {
        self.social
            .list_notifications(user, unread_only)
            .await
            .map_err(map_social_error)
    }

    async fn mark_read(&self, user: &UserId, ids: Option<Vec<Uuid>>) -> Result<u64, Error> {
        let ids = ids.filter(|ids| !ids.is_empty());
        self.social
            .mark_notifications_read(user, ids)
            .await
            .map_err(map_social_error)
    }
}

#[cfg(test)]
#[path = "interactions_service_tests.rs"]
mod tests;
