//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, plus the services that implement the driving ports.
//! Keep types immutable and document invariants and serialisation contracts
//! (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - User, Project, Comment, Notification — persisted aggregates.
//! - GenerationEvent, CodeFragment — frames of the code-generation stream.
//! - Locale — supported UI locales and their message bundles.
//! - *Service types — implementations of the driving ports in [`ports`].

pub mod auth;
pub mod error;
pub mod files;
pub mod generation;
pub mod i18n;
pub mod ports;
pub mod project;
pub mod recommendation;
pub mod social;
pub mod trace_id;
pub mod user;

mod accounts_service;
mod files_service;
mod generation_service;
mod interactions_service;
mod projects_service;
mod service_errors;

pub use self::accounts_service::AccountsService;
pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MAX, PASSWORD_MIN, Registration,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::files::{
    BlobMeta, BlobPath, BlobPathError, DEFAULT_UPLOAD_LIMIT, PATH_MAX, StoredFile,
};
pub use self::files_service::FilesService;
pub use self::generation::{
    CodeFragment, DEFAULT_PROGRESS_INTERVAL, DEFAULT_PROVIDER, DEFAULT_TEMPLATE, ExtractedCode,
    GenerationEvent, GenerationRequest, GenerationValidationError, ModelSpec, PROMPT_MAX,
    TEMPLATES, Template, extract_code, select_model, system_prompt, template_by_id,
};
pub use self::generation_service::GenerationService;
pub use self::i18n::{
    LOCALE_COOKIE, Locale, UnsupportedLocale, from_accept_language, messages_with_fallback,
    negotiate_locale, safe_redirect, translate,
};
pub use self::interactions_service::InteractionsService;
pub use self::project::{
    ExternalSource, FEED_LIMIT_DEFAULT, FEED_LIMIT_MAX, FeedPage, FeedQuery, Project,
    ProjectDetail, ProjectDraft, ProjectFile, ProjectId, ProjectInput, ProjectPatch, ProjectType,
    ProjectValidationError, ViewerState, is_http_url, is_relative_path,
};
pub use self::projects_service::ProjectsService;
pub use self::recommendation::{
    Recommendation, RecommendationService, RecommendationStrategy, escape_like,
    similarity_keyword,
};
pub use self::social::{
    COMMENT_MAX, Comment, CommentBody, CommentId, CommentThread, FollowCounts, LikeOutcome,
    NOTIFICATIONS_LIMIT, NewComment, NewNotification, Notification, NotificationKind,
    SharePlatform, SocialValidationError, build_threads,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    DisplayName, Email, NewUserAccount, ProfileUpdate, User, UserAccount, UserId, UserProfile,
    UserValidationError, validate_avatar, validate_bio,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use codetok::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
