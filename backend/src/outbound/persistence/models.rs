//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations. Conversions into domain
//! types report malformed rows as strings so each repository can wrap them
//! in its own query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentId, DisplayName, Email, ExternalSource, Notification, NotificationKind,
    Project, ProjectFile, ProjectId, ProjectType, User, UserAccount, UserId,
};

use super::schema::{comments, favorites, follows, likes, notifications, projects, shares, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, String> {
        self.into_account().map(|account| account.user)
    }

    pub(crate) fn into_account(self) -> Result<UserAccount, String> {
        let email = Email::new(&self.email).map_err(|err| format!("stored email: {err}"))?;
        let name = DisplayName::new(&self.name).map_err(|err| format!("stored name: {err}"))?;
        Ok(UserAccount {
            user: User {
                id: UserId::from_uuid(self.id),
                email,
                name,
                avatar: self.avatar,
                bio: self.bio,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            password_hash: self.password_hash,
        })
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
}

/// Changeset for profile edits; `None` leaves a column untouched and
/// `Some(None)` clears a nullable column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct ProfileChangeset<'a> {
    pub name: Option<&'a str>,
    pub avatar: Option<Option<&'a str>>,
    pub bio: Option<Option<&'a str>>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Project models
// ---------------------------------------------------------------------------

/// Row struct for reading from the projects table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub files: serde_json::Value,
    pub main_file: Option<String>,
    pub is_public: bool,
    pub views: i64,
    pub likes: i64,
    pub external_url: Option<String>,
    pub external_embed: Option<String>,
    pub external_author: Option<String>,
    pub project_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRow {
    pub(crate) fn into_project(self) -> Result<Project, String> {
        let files: Vec<ProjectFile> = serde_json::from_value(self.files)
            .map_err(|err| format!("stored files for project {}: {err}", self.id))?;
        let project_type = self.project_type.parse().unwrap_or_else(|_| {
            warn!(
                value = %self.project_type,
                project_id = %self.id,
                "unrecognised project_type value, defaulting to code"
            );
            ProjectType::Code
        });
        Ok(Project {
            id: ProjectId::from_uuid(self.id),
            author_id: self.author_id.map(UserId::from_uuid),
            title: self.title,
            description: self.description,
            files,
            main_file: self.main_file,
            is_public: self.is_public,
            views: self.views,
            likes: self.likes,
            external: ExternalSource {
                url: self.external_url,
                embed: self.external_embed,
                author: self.external_author,
            },
            project_type,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable struct for creating projects.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub(crate) struct NewProjectRow<'a> {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub title: &'a str,
    pub description: &'a str,
    pub files: serde_json::Value,
    pub main_file: Option<&'a str>,
    pub is_public: bool,
    pub external_url: Option<&'a str>,
    pub external_embed: Option<&'a str>,
    pub external_author: Option<&'a str>,
    pub project_type: &'a str,
}

/// Full replacement of the editable project columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects, treat_none_as_null = true)]
pub(crate) struct ProjectChangeset<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub files: serde_json::Value,
    pub main_file: Option<&'a str>,
    pub is_public: bool,
    pub external_url: Option<&'a str>,
    pub external_embed: Option<&'a str>,
    pub external_author: Option<&'a str>,
    pub project_type: &'a str,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Social edge models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = likes)]
pub(crate) struct NewLikeRow {
    pub user_id: Uuid,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = favorites)]
pub(crate) struct NewFavoriteRow {
    pub user_id: Uuid,
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = follows)]
pub(crate) struct NewFollowRow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shares)]
pub(crate) struct NewShareRow<'a> {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Option<Uuid>,
    pub platform: &'a str,
}

// ---------------------------------------------------------------------------
// Comment and notification models
// ---------------------------------------------------------------------------

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentRow {
    /// Combine with the author row loaded by a join.
    pub(crate) fn into_comment(self, author: UserRow) -> Result<Comment, String> {
        Ok(Comment {
            id: CommentId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            author: author.into_user()?,
            parent_id: self.parent_id.map(CommentId::from_uuid),
            content: self.content,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: &'a str,
}

/// Row struct for reading from the notifications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub kind: String,
    pub entity_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRow {
    /// Combine with the actor row loaded by a join.
    pub(crate) fn into_notification(self, actor: UserRow) -> Result<Notification, String> {
        let kind: NotificationKind = self.kind.parse()?;
        Ok(Notification {
            id: self.id,
            recipient_id: UserId::from_uuid(self.recipient_id),
            actor: actor.into_user()?,
            kind,
            entity_id: self.entity_id,
            read: self.read,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub kind: &'a str,
    pub entity_id: Uuid,
}
