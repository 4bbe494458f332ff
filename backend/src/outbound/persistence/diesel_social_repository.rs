//! PostgreSQL-backed `SocialRepository` implementation using Diesel ORM.
//!
//! Like toggles adjust `projects.likes` in the same transaction as the edge
//! row, and comments are inserted together with their notifications.

use async_trait::async_trait;
use diesel::dsl::{count_star, exists};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{SocialPersistenceError, SocialRepository};
use crate::domain::{
    Comment, CommentId, FollowCounts, LikeOutcome, NOTIFICATIONS_LIMIT, NewComment,
    NewNotification, Notification, Project, ProjectId, SharePlatform, UserId, ViewerState,
};

use super::error_mapping::{map_diesel_error_with, map_pool_error_with};
use super::models::{
    CommentRow, NewCommentRow, NewFavoriteRow, NewFollowRow, NewLikeRow, NewNotificationRow,
    NewShareRow, NotificationRow, ProjectRow, UserRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{comments, favorites, follows, likes, notifications, projects, shares, users};

/// Diesel-backed implementation of the `SocialRepository` port.
#[derive(Clone)]
pub struct DieselSocialRepository {
    pool: DbPool,
}

impl DieselSocialRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SocialPersistenceError {
    map_pool_error_with(error, SocialPersistenceError::connection)
}

fn map_diesel_error(error: DieselError) -> SocialPersistenceError {
    map_diesel_error_with(
        error,
        SocialPersistenceError::query,
        SocialPersistenceError::connection,
    )
}

fn notification_rows(pending: &[NewNotification]) -> Vec<NewNotificationRow<'_>> {
    pending
        .iter()
        .map(|notification| NewNotificationRow {
            id: Uuid::new_v4(),
            recipient_id: *notification.recipient_id.as_uuid(),
            actor_id: *notification.actor_id.as_uuid(),
            kind: notification.kind.as_str(),
            entity_id: notification.entity_id,
        })
        .collect()
}

fn into_comment((row, author): (CommentRow, UserRow)) -> Result<Comment, SocialPersistenceError> {
    row.into_comment(author).map_err(SocialPersistenceError::query)
}

#[async_trait]
impl SocialRepository for DieselSocialRepository {
    async fn toggle_like(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<LikeOutcome, SocialPersistenceError> {
        let user_id = *user.as_uuid();
        let project_id = *project.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, DieselError, _>(|conn| {
            async move {
                let removed = diesel::delete(
                    likes::table
                        .filter(likes::user_id.eq(user_id))
                        .filter(likes::project_id.eq(project_id)),
                )
                .execute(conn)
                .await?;

                let (liked, delta) = if removed > 0 {
                    (false, -1_i64)
                } else {
                    diesel::insert_into(likes::table)
                        .values(&NewLikeRow {
                            user_id,
                            project_id,
                        })
                        .execute(conn)
                        .await?;
                    (true, 1_i64)
                };

                let total: i64 = diesel::update(projects::table.find(project_id))
                    .set(projects::likes.eq(projects::likes + delta))
                    .returning(projects::likes)
                    .get_result(conn)
                    .await?;
                Ok(LikeOutcome {
                    liked,
                    likes: total,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn viewer_state(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<ViewerState, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let liked: bool = diesel::select(exists(
            likes::table
                .filter(likes::user_id.eq(*user.as_uuid()))
                .filter(likes::project_id.eq(*project.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        let favorited: bool = diesel::select(exists(
            favorites::table
                .filter(favorites::user_id.eq(*user.as_uuid()))
                .filter(favorites::project_id.eq(*project.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(ViewerState { liked, favorited })
    }

    async fn toggle_favorite(
        &self,
        user: &UserId,
        project: &ProjectId,
    ) -> Result<bool, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            favorites::table
                .filter(favorites::user_id.eq(*user.as_uuid()))
                .filter(favorites::project_id.eq(*project.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if removed > 0 {
            return Ok(false);
        }
        diesel::insert_into(favorites::table)
            .values(&NewFavoriteRow {
                user_id: *user.as_uuid(),
                project_id: *project.as_uuid(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(true)
    }

    async fn list_favorites(&self, user: &UserId) -> Result<Vec<Project>, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProjectRow> = favorites::table
            .inner_join(projects::table)
            .filter(favorites::user_id.eq(*user.as_uuid()))
            .order(favorites::created_at.desc())
            .select(ProjectRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| row.into_project().map_err(SocialPersistenceError::query))
            .collect()
    }

    async fn add_comment(
        &self,
        comment: &NewComment,
        pending: &[NewNotification],
    ) -> Result<Comment, SocialPersistenceError> {
        let row = NewCommentRow {
            id: *comment.id.as_uuid(),
            project_id: *comment.project_id.as_uuid(),
            author_id: *comment.author_id.as_uuid(),
            parent_id: comment.parent_id.map(|id| *id.as_uuid()),
            content: comment.content.as_ref(),
        };
        let notification_rows = notification_rows(pending);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored = conn
            .transaction::<_, DieselError, _>(|conn| {
                async move {
                    diesel::insert_into(comments::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    if !notification_rows.is_empty() {
                        diesel::insert_into(notifications::table)
                            .values(&notification_rows)
                            .execute(conn)
                            .await?;
                    }
                    comments::table
                        .inner_join(users::table)
                        .filter(comments::id.eq(row.id))
                        .select((CommentRow::as_select(), UserRow::as_select()))
                        .first::<(CommentRow, UserRow)>(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        into_comment(stored)
    }

    async fn find_comment(&self, id: &CommentId) -> Result<Option<Comment>, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(CommentRow, UserRow)> = comments::table
            .inner_join(users::table)
            .filter(comments::id.eq(*id.as_uuid()))
            .select((CommentRow::as_select(), UserRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(into_comment).transpose()
    }

    async fn list_comments(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Comment>, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(CommentRow, UserRow)> = comments::table
            .inner_join(users::table)
            .filter(comments::project_id.eq(*project.as_uuid()))
            .order(comments::created_at.asc())
            .select((CommentRow::as_select(), UserRow::as_select()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(into_comment).collect()
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<bool, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(comments::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn count_comments(&self, project: &ProjectId) -> Result<i64, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        comments::table
            .filter(comments::project_id.eq(*project.as_uuid()))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn toggle_follow(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            follows::table
                .filter(follows::follower_id.eq(*follower.as_uuid()))
                .filter(follows::following_id.eq(*following.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        if removed > 0 {
            return Ok(false);
        }
        diesel::insert_into(follows::table)
            .values(&NewFollowRow {
                follower_id: *follower.as_uuid(),
                following_id: *following.as_uuid(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(true)
    }

    async fn follow_counts(&self, user: &UserId) -> Result<FollowCounts, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let followers: i64 = follows::table
            .filter(follows::following_id.eq(*user.as_uuid()))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let following: i64 = follows::table
            .filter(follows::follower_id.eq(*user.as_uuid()))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(FollowCounts {
            followers,
            following,
        })
    }

    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            follows::table
                .filter(follows::follower_id.eq(*follower.as_uuid()))
                .filter(follows::following_id.eq(*following.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn record_share(
        &self,
        project: &ProjectId,
        user: Option<UserId>,
        platform: SharePlatform,
    ) -> Result<i64, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(shares::table)
            .values(&NewShareRow {
                id: Uuid::new_v4(),
                project_id: *project.as_uuid(),
                user_id: user.as_ref().map(|user| *user.as_uuid()),
                platform: platform.as_str(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        shares::table
            .filter(shares::project_id.eq(*project.as_uuid()))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn count_shares(&self, project: &ProjectId) -> Result<i64, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        shares::table
            .filter(shares::project_id.eq(*project.as_uuid()))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn notify(&self, notification: &NewNotification) -> Result<(), SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(notifications::table)
            .values(&notification_rows(std::slice::from_ref(notification)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_notifications(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut statement = notifications::table
            .inner_join(users::table)
            .filter(notifications::recipient_id.eq(*user.as_uuid()))
            .select((NotificationRow::as_select(), UserRow::as_select()))
            .into_boxed();
        if unread_only {
            statement = statement.filter(notifications::read.eq(false));
        }
        let rows: Vec<(NotificationRow, UserRow)> = statement
            .order(notifications::created_at.desc())
            .limit(i64::from(NOTIFICATIONS_LIMIT))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|(row, actor)| {
                row.into_notification(actor)
                    .map_err(SocialPersistenceError::query)
            })
            .collect()
    }

    async fn mark_notifications_read(
        &self,
        user: &UserId,
        ids: Option<Vec<Uuid>>,
    ) -> Result<u64, SocialPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let unread = notifications::table
            .filter(notifications::recipient_id.eq(*user.as_uuid()))
            .filter(notifications::read.eq(false));
        let updated = match ids {
            Some(ids) => {
                diesel::update(unread.filter(notifications::id.eq_any(ids)))
                    .set(notifications::read.eq(true))
                    .execute(&mut conn)
                    .await
            }
            None => {
                diesel::update(unread)
                    .set(notifications::read.eq(true))
                    .execute(&mut conn)
                    .await
            }
        }
        .map_err(map_diesel_error)?;
        Ok(updated as u64)
    }
}
