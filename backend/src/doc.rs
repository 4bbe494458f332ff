//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer
//! - **Schemas**: request and response DTOs plus the error wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]) that describe domain errors
//!   without coupling domain types to utoipa
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::ai::{GenerateRequest, TemplateResponse};
use crate::inbound::http::auth::{LoginRequest, RegisterRequest};
use crate::inbound::http::dto::{
    CommentResponse, FeedPageResponse, FileMetaResponse, NotificationResponse, ProfileResponse,
    ProjectDetailResponse, ProjectFileDto, ProjectResponse, RecommendationResponse, UserResponse,
    ViewerStateResponse,
};
use crate::inbound::http::i18n::{MessageResponse, MessagesResponse};
use crate::inbound::http::projects::{
    CommentRequest, CreateProjectRequest, UpdateProjectRequest, ViewsResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::social::{
    FavoriteResponse, FollowResponse, LikeResponse, MarkReadRequest, MarkReadResponse,
    ShareRequest, ShareResponse,
};
use crate::inbound::http::users::ProfilePatchRequest;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/auth/login or /api/auth/register.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "CodeTok backend API",
        description = "Accounts, project feed, social interactions, streaming code generation, \
                       per-user files and interface messages."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::current_session,
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::list_user_projects,
        crate::inbound::http::projects::list_feed,
        crate::inbound::http::projects::create_project,
        crate::inbound::http::projects::get_project,
        crate::inbound::http::projects::update_project,
        crate::inbound::http::projects::delete_project,
        crate::inbound::http::projects::record_view,
        crate::inbound::http::projects::recommend,
        crate::inbound::http::projects::list_comments,
        crate::inbound::http::projects::add_comment,
        crate::inbound::http::social::toggle_like,
        crate::inbound::http::social::toggle_favorite,
        crate::inbound::http::social::list_favorites,
        crate::inbound::http::social::delete_comment,
        crate::inbound::http::social::toggle_follow,
        crate::inbound::http::social::share_project,
        crate::inbound::http::social::list_notifications,
        crate::inbound::http::social::mark_read,
        crate::inbound::http::ai::generate,
        crate::inbound::http::ai::list_templates,
        crate::inbound::http::files::list_files,
        crate::inbound::http::files::put_file,
        crate::inbound::http::files::get_file,
        crate::inbound::http::files::delete_file,
        crate::inbound::http::i18n::get_messages,
        crate::inbound::http::i18n::get_message,
        crate::inbound::http::i18n::switch_locale,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequest,
        LoginRequest,
        UserResponse,
        ProfileResponse,
        ProfilePatchRequest,
        ProjectFileDto,
        ProjectResponse,
        FeedPageResponse,
        ViewerStateResponse,
        ProjectDetailResponse,
        RecommendationResponse,
        CreateProjectRequest,
        UpdateProjectRequest,
        ViewsResponse,
        CommentRequest,
        CommentResponse,
        LikeResponse,
        FavoriteResponse,
        FollowResponse,
        ShareRequest,
        ShareResponse,
        NotificationResponse,
        MarkReadRequest,
        MarkReadResponse,
        GenerateRequest,
        TemplateResponse,
        FileMetaResponse,
        MessagesResponse,
        MessageResponse,
    )),
    tags(
        (name = "auth", description = "Registration and session management"),
        (name = "users", description = "Profiles"),
        (name = "projects", description = "Feed, project CRUD, comments and recommendations"),
        (name = "social", description = "Likes, favourites, follows, shares and notifications"),
        (name = "ai", description = "Streaming code generation"),
        (name = "files", description = "Per-user file manager"),
        (name = "i18n", description = "Interface messages and locale switching"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
