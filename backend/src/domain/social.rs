//! Social interactions: comments, shares, notifications and toggle outcomes.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ProjectId, User, UserId};

/// Maximum comment length after trimming.
pub const COMMENT_MAX: usize = 2000;
/// Newest notifications returned per listing.
pub const NOTIFICATIONS_LIMIT: u32 = 100;

/// Validation errors for social payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SocialValidationError {
    #[error("comment must not be empty")]
    EmptyComment,
    #[error("comment must be at most {max} characters")]
    CommentTooLong { max: usize },
    #[error("unknown share platform '{value}'")]
    UnknownPlatform { value: String },
    #[error("comment id must be a valid UUID")]
    InvalidCommentId,
}

/// Identifier of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SocialValidationError> {
        Uuid::parse_str(raw.as_ref().trim())
            .map(Self)
            .map_err(|_| SocialValidationError::InvalidCommentId)
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trimmed, length-checked comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SocialValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(SocialValidationError::EmptyComment);
        }
        if trimmed.chars().count() > COMMENT_MAX {
            return Err(SocialValidationError::CommentTooLong { max: COMMENT_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for CommentBody {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Stored comment with its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub project_id: ProjectId,
    pub author: User,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub id: CommentId,
    pub project_id: ProjectId,
    pub author_id: UserId,
    pub parent_id: Option<CommentId>,
    pub content: CommentBody,
}

/// A root comment with its replies nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

/// Arrange a flat comment list into threads.
///
/// Roots and replies are ordered oldest first. Replies whose parent is
/// missing from the list are promoted to roots so nothing is dropped.
pub fn build_threads(mut comments: Vec<Comment>) -> Vec<CommentThread> {
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let known: std::collections::HashSet<CommentId> = comments.iter().map(|c| c.id).collect();

    let mut children: HashMap<CommentId, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent) if known.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    fn attach(comment: Comment, children: &mut HashMap<CommentId, Vec<Comment>>) -> CommentThread {
        let replies = children
            .remove(&comment.id)
            .unwrap_or_default()
            .into_iter()
            .map(|reply| attach(reply, children))
            .collect();
        CommentThread { comment, replies }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children))
        .collect()
}

/// Where a project was shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharePlatform {
    Twitter,
    Facebook,
    Linkedin,
    Reddit,
    CopyLink,
    Other,
}

impl SharePlatform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Linkedin => "linkedin",
            Self::Reddit => "reddit",
            Self::CopyLink => "copy_link",
            Self::Other => "other",
        }
    }
}

impl FromStr for SharePlatform {
    type Err = SocialValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            "linkedin" => Ok(Self::Linkedin),
            "reddit" => Ok(Self::Reddit),
            "copy_link" => Ok(Self::CopyLink),
            "other" => Ok(Self::Other),
            other => Err(SocialValidationError::UnknownPlatform {
                value: other.to_owned(),
            }),
        }
    }
}

/// Kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Reply,
    Follow,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Reply => "reply",
            Self::Follow => "follow",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            "reply" => Ok(Self::Reply),
            "follow" => Ok(Self::Follow),
            other => Err(format!("unknown notification kind '{other}'")),
        }
    }
}

/// Notification delivered to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub actor: User,
    pub kind: NotificationKind,
    pub entity_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub kind: NotificationKind,
    pub entity_id: Uuid,
}

impl NewNotification {
    /// Build a notification unless the actor is the recipient.
    pub fn unless_self(
        recipient_id: &UserId,
        actor_id: &UserId,
        kind: NotificationKind,
        entity_id: Uuid,
    ) -> Option<Self> {
        (recipient_id != actor_id).then(|| Self {
            recipient_id: recipient_id.clone(),
            actor_id: actor_id.clone(),
            kind,
            entity_id,
        })
    }
}

/// Follower and following totals for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn user() -> User {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid time");
        User {
            id: UserId::random(),
            email: crate::domain::Email::new("ada@example.com").expect("email"),
            name: crate::domain::DisplayName::new("Ada").expect("name"),
            avatar: None,
            bio: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn comment(minute: u32, parent: Option<CommentId>) -> Comment {
        Comment {
            id: CommentId::random(),
            project_id: ProjectId::from_uuid(Uuid::nil()),
            author: user(),
            parent_id: parent,
            content: format!("at {minute}"),
            created_at: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, minute, 0)
                .single()
                .expect("valid time"),
        }
    }

    #[rstest]
    #[case("", SocialValidationError::EmptyComment)]
    #[case("  \n ", SocialValidationError::EmptyComment)]
    fn blank_comments_are_rejected(#[case] raw: &str, #[case] expected: SocialValidationError) {
        assert_eq!(CommentBody::new(raw), Err(expected));
    }

    #[rstest]
    fn long_comments_are_rejected() {
        let raw = "x".repeat(COMMENT_MAX + 1);
        assert_eq!(
            CommentBody::new(raw),
            Err(SocialValidationError::CommentTooLong { max: COMMENT_MAX })
        );
    }

    #[rstest]
    fn threads_nest_replies_oldest_first() {
        let root_late = comment(5, None);
        let root_early = comment(1, None);
        let reply_b = comment(4, Some(root_early.id));
        let reply_a = comment(2, Some(root_early.id));
        let nested = comment(3, Some(reply_a.id));
        let orphan = comment(6, Some(CommentId::random()));

        let threads = build_threads(vec![
            root_late.clone(),
            reply_b.clone(),
            nested.clone(),
            root_early.clone(),
            reply_a.clone(),
            orphan.clone(),
        ]);

        let ids: Vec<_> = threads.iter().map(|t| t.comment.id).collect();
        assert_eq!(ids, vec![root_early.id, root_late.id, orphan.id]);
        let replies: Vec<_> = threads[0].replies.iter().map(|t| t.comment.id).collect();
        assert_eq!(replies, vec![reply_a.id, reply_b.id]);
        assert_eq!(threads[0].replies[0].replies[0].comment.id, nested.id);
    }

    #[rstest]
    #[case("twitter", SharePlatform::Twitter)]
    #[case("COPY_LINK", SharePlatform::CopyLink)]
    #[case(" reddit ", SharePlatform::Reddit)]
    fn platforms_parse(#[case] raw: &str, #[case] expected: SharePlatform) {
        assert_eq!(raw.parse::<SharePlatform>(), Ok(expected));
    }

    #[rstest]
    fn unknown_platform_is_rejected() {
        assert!(matches!(
            "myspace".parse::<SharePlatform>(),
            Err(SocialValidationError::UnknownPlatform { .. })
        ));
    }

    #[rstest]
    fn self_notifications_are_suppressed() {
        let ada = UserId::random();
        let bob = UserId::random();
        assert!(NewNotification::unless_self(&ada, &ada, NotificationKind::Like, Uuid::nil()).is_none());
        assert!(NewNotification::unless_self(&ada, &bob, NotificationKind::Like, Uuid::nil()).is_some());
    }
}
