//! JSON payloads shared by several endpoint groups.
//!
//! Domain types stay free of serde and utoipa concerns where their wire
//! shape differs from the stored shape; these DTOs define the camelCase
//! contract instead.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    BlobMeta, Comment, CommentThread, FeedPage, Notification, Project, ProjectDetail, ProjectFile,
    Recommendation, User, UserProfile,
};

/// Public view of a user. `email` is only present for the account owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

impl UserResponse {
    /// Shape shown to other users.
    pub fn public(user: User) -> Self {
        Self {
            email: None,
            ..Self::own(user)
        }
    }

    /// Shape shown to the account owner.
    pub fn own(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: Some(user.email.as_ref().to_owned()),
            name: user.name.as_ref().to_owned(),
            avatar: user.avatar,
            bio: user.bio,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// User profile with social counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub followers: i64,
    pub following: i64,
    pub projects: i64,
    pub is_following: bool,
}

impl ProfileResponse {
    pub fn new(profile: UserProfile, own: bool) -> Self {
        let user = if own {
            UserResponse::own(profile.user)
        } else {
            UserResponse::public(profile.user)
        };
        Self {
            user,
            followers: profile.followers,
            following: profile.following,
            projects: profile.projects,
            is_following: profile.is_following,
        }
    }
}

/// File descriptor inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFileDto {
    #[schema(example = "index.html")]
    pub name: String,
    #[schema(example = "src/index.html")]
    pub path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl From<ProjectFile> for ProjectFileDto {
    fn from(value: ProjectFile) -> Self {
        Self {
            name: value.name,
            path: value.path,
            language: value.language,
            content: value.content,
            size: value.size,
        }
    }
}

impl From<ProjectFileDto> for ProjectFile {
    fn from(value: ProjectFileDto) -> Self {
        Self {
            name: value.name,
            path: value.path,
            language: value.language,
            content: value.content,
            size: value.size,
        }
    }
}

/// Project as returned by the feed and detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub author_id: Option<String>,
    #[schema(example = "Bouncing ball")]
    pub title: String,
    pub description: String,
    pub files: Vec<ProjectFileDto>,
    pub main_file: Option<String>,
    pub is_public: bool,
    pub views: i64,
    pub likes: i64,
    pub external_url: Option<String>,
    pub external_embed: Option<String>,
    pub external_author: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "code")]
    pub project_type: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Project> for ProjectResponse {
    fn from(value: Project) -> Self {
        Self {
            id: value.id.to_string(),
            author_id: value.author_id.map(|id| id.to_string()),
            title: value.title,
            description: value.description,
            files: value.files.into_iter().map(ProjectFileDto::from).collect(),
            main_file: value.main_file,
            is_public: value.is_public,
            views: value.views,
            likes: value.likes,
            external_url: value.external.url,
            external_embed: value.external.embed,
            external_author: value.external.author,
            project_type: value.project_type.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// One page of the public feed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPageResponse {
    pub items: Vec<ProjectResponse>,
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

impl From<FeedPage> for FeedPageResponse {
    fn from(value: FeedPage) -> Self {
        Self {
            items: value.items.into_iter().map(ProjectResponse::from).collect(),
            limit: value.limit,
            offset: value.offset,
            has_more: value.has_more,
        }
    }
}

/// What the current viewer has done to a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewerStateResponse {
    pub liked: bool,
    pub favorited: bool,
}

/// Project detail with counters and viewer state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub comments: i64,
    pub shares: i64,
    pub viewer: ViewerStateResponse,
}

impl From<ProjectDetail> for ProjectDetailResponse {
    fn from(value: ProjectDetail) -> Self {
        Self {
            project: value.project.into(),
            comments: value.comments,
            shares: value.shares,
            viewer: ViewerStateResponse {
                liked: value.viewer.liked,
                favorited: value.viewer.favorited,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub project: ProjectResponse,
    /// `newest`, `most_viewed`, `similar`, `random` or `cached_pool`.
    #[schema(example = "most_viewed")]
    pub strategy: String,
}

impl From<Recommendation> for RecommendationResponse {
    fn from(value: Recommendation) -> Self {
        Self {
            project: value.project.into(),
            strategy: value.strategy.as_str().to_owned(),
        }
    }
}

/// Comment with its nested replies.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub author: UserResponse,
    pub created_at: String,
    #[schema(no_recursion)]
    pub replies: Vec<CommentResponse>,
}

impl From<Comment> for CommentResponse {
    fn from(value: Comment) -> Self {
        Self {
            id: value.id.to_string(),
            project_id: value.project_id.to_string(),
            parent_id: value.parent_id.map(|id| id.to_string()),
            content: value.content,
            author: UserResponse::public(value.author),
            created_at: value.created_at.to_rfc3339(),
            replies: Vec::new(),
        }
    }
}

impl From<CommentThread> for CommentResponse {
    fn from(value: CommentThread) -> Self {
        Self {
            replies: value.replies.into_iter().map(Self::from).collect(),
            ..Self::from(value.comment)
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub actor: UserResponse,
    /// `like`, `comment`, `reply` or `follow`.
    pub kind: String,
    pub entity_id: String,
    pub read: bool,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(value: Notification) -> Self {
        Self {
            id: value.id.to_string(),
            actor: UserResponse::public(value.actor),
            kind: value.kind.as_str().to_owned(),
            entity_id: value.entity_id.to_string(),
            read: value.read,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Stored file metadata; `path` is relative to the caller's file root.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetaResponse {
    #[schema(example = "fragments/3fa85f64-5717-4562-b3fc-2c963f66afa6/index.html")]
    pub path: String,
    pub size: u64,
    pub etag: String,
}

impl From<BlobMeta> for FileMetaResponse {
    fn from(value: BlobMeta) -> Self {
        Self {
            path: value.path.to_string(),
            size: value.size,
            etag: value.etag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CommentId, DisplayName, Email, ExternalSource, ProjectId, ProjectType, UserId,
    };
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn user() -> User {
        let at = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp");
        User {
            id: UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("user id"),
            email: Email::new("ada@example.com").expect("email"),
            name: DisplayName::new("Ada").expect("name"),
            avatar: None,
            bio: Some("maths".to_owned()),
            created_at: at,
            updated_at: at,
        }
    }

    fn project(author: &User) -> Project {
        Project {
            id: ProjectId::random(),
            author_id: Some(author.id.clone()),
            title: "Demo".to_owned(),
            description: String::new(),
            files: Vec::new(),
            main_file: None,
            is_public: true,
            views: 3,
            likes: 1,
            external: ExternalSource {
                url: Some("https://codepen.io/x".to_owned()),
                ..ExternalSource::default()
            },
            project_type: ProjectType::External,
            created_at: author.created_at,
            updated_at: author.created_at,
        }
    }

    #[rstest]
    fn public_users_hide_the_email(user: User) {
        let value = serde_json::to_value(UserResponse::public(user.clone())).expect("json");
        assert!(value.get("email").is_none());
        assert_eq!(value["createdAt"], "2026-01-01T00:00:00+00:00");

        let own = serde_json::to_value(UserResponse::own(user)).expect("json");
        assert_eq!(own["email"], "ada@example.com");
    }

    #[rstest]
    fn profiles_flatten_the_user(user: User) {
        let profile = UserProfile {
            user,
            followers: 2,
            following: 1,
            projects: 4,
            is_following: true,
        };
        let value = serde_json::to_value(ProfileResponse::new(profile, false)).expect("json");
        assert_eq!(value["name"], "Ada");
        assert_eq!(value["isFollowing"], true);
        assert_eq!(value["projects"], 4);
    }

    #[rstest]
    fn projects_use_camel_case_and_a_type_field(user: User) {
        let value = serde_json::to_value(ProjectResponse::from(project(&user))).expect("json");
        assert_eq!(value["type"], "external");
        assert_eq!(value["externalUrl"], "https://codepen.io/x");
        assert_eq!(value["isPublic"], true);
        assert!(value.get("project_type").is_none());
    }

    #[rstest]
    fn comment_threads_nest_replies(user: User) {
        let project_id = ProjectId::random();
        let root = Comment {
            id: CommentId::random(),
            project_id,
            author: user.clone(),
            parent_id: None,
            content: "root".to_owned(),
            created_at: user.created_at,
        };
        let reply = Comment {
            id: CommentId::random(),
            parent_id: Some(root.id),
            content: "reply".to_owned(),
            ..root.clone()
        };
        let thread = CommentThread {
            comment: root,
            replies: vec![CommentThread {
                comment: reply,
                replies: Vec::new(),
            }],
        };

        let value = serde_json::to_value(CommentResponse::from(thread)).expect("json");
        assert_eq!(value["content"], "root");
        assert_eq!(value["replies"][0]["content"], "reply");
        assert_eq!(value["replies"][0]["replies"], json!([]));
        assert_eq!(value["author"].get("email"), None::<&Value>);
    }
}
