//! Social endpoints: likes, favourites, follows, shares, comment deletion
//! and notifications.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::SharePlatform;
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::dto::{NotificationResponse, ProjectResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, field_error, missing_field_error, parse_comment_id, parse_project_id,
    parse_user_id, social_validation_error,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FavoriteResponse {
    pub favorited: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowResponse {
    pub following: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    /// Total shares of the project.
    pub shares: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareRequest {
    /// `twitter`, `facebook`, `linkedin`, `reddit`, `copy_link` or `other`.
    #[schema(example = "copy_link")]
    pub platform: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MarkReadRequest {
    /// Notification ids; empty or missing marks everything read.
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// Toggle the signed-in user's like on a project.
#[utoipa::path(
    post,
    path = "/api/social/likes/{projectId}",
    params(("projectId" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "New like state", body = LikeResponse),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "toggleLike"
)]
#[post("/likes/{project_id}")]
pub async fn toggle_like(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<LikeResponse>> {
    let user = session.require_user_id()?;
    let project = parse_project_id(&path)?;
    let outcome = state.social.toggle_like(&user, &project).await?;
    Ok(web::Json(LikeResponse {
        liked: outcome.liked,
        likes: outcome.likes,
    }))
}

/// Toggle a bookmark on a project.
#[utoipa::path(
    post,
    path = "/api/social/favorites/{projectId}",
    params(("projectId" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "New favourite state", body = FavoriteResponse),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "toggleFavorite"
)]
#[post("/favorites/{project_id}")]
pub async fn toggle_favorite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FavoriteResponse>> {
    let user = session.require_user_id()?;
    let project = parse_project_id(&path)?;
    let favorited = state.social.toggle_favorite(&user, &project).await?;
    Ok(web::Json(FavoriteResponse { favorited }))
}

/// The signed-in user's bookmarked projects.
#[utoipa::path(
    get,
    path = "/api/social/favorites",
    responses(
        (status = 200, description = "Favourites", body = [ProjectResponse]),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "listFavorites"
)]
#[get("/favorites")]
pub async fn list_favorites(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let projects: Vec<ProjectResponse> = state
        .social
        .favorites(&user)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(projects))
}

/// Delete one of the signed-in user's comments.
#[utoipa::path(
    delete,
    path = "/api/social/comments/{commentId}",
    params(("commentId" = String, Path, description = "Comment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "Unknown comment", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "deleteComment"
)]
#[delete("/comments/{comment_id}")]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let comment = parse_comment_id(&path)?;
    state.social.delete_comment(&user, &comment).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Toggle following another user.
#[utoipa::path(
    post,
    path = "/api/social/follows/{userId}",
    params(("userId" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "New follow state", body = FollowResponse),
        (status = 400, description = "Self-follow", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "toggleFollow"
)]
#[post("/follows/{user_id}")]
pub async fn toggle_follow(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FollowResponse>> {
    let follower = session.require_user_id()?;
    let target = parse_user_id(&path)?;
    let following = state.social.toggle_follow(&follower, &target).await?;
    Ok(web::Json(FollowResponse { following }))
}

/// Record a share; anonymous shares are allowed.
#[utoipa::path(
    post,
    path = "/api/social/shares/{projectId}",
    params(("projectId" = String, Path, description = "Project id")),
    request_body = ShareRequest,
    responses(
        (status = 201, description = "Share recorded", body = ShareResponse),
        (status = 400, description = "Unknown platform", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "shareProject",
    security([])
)]
#[post("/shares/{project_id}")]
pub async fn share_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ShareRequest>,
) -> ApiResult<HttpResponse> {
    let project = parse_project_id(&path)?;
    let platform = payload
        .into_inner()
        .platform
        .ok_or_else(|| missing_field_error(FieldName::new("platform")))?
        .parse::<SharePlatform>()
        .map_err(social_validation_error)?;
    let shares = state
        .social
        .share(&project, session.user_id()?, platform)
        .await?;
    Ok(HttpResponse::Created().json(ShareResponse { shares }))
}

/// The signed-in user's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/social/notifications",
    params(NotificationParams),
    responses(
        (status = 200, description = "Notifications", body = [NotificationResponse]),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<NotificationParams>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let notifications: Vec<NotificationResponse> = state
        .social
        .notifications(&user, query.unread_only)
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(notifications))
}

/// Mark notifications read.
#[utoipa::path(
    post,
    path = "/api/social/notifications/read",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Rows updated", body = MarkReadResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["social"],
    operation_id = "markNotificationsRead"
)]
#[post("/notifications/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: Option<web::Json<MarkReadRequest>>,
) -> ApiResult<web::Json<MarkReadResponse>> {
    let user = session.require_user_id()?;
    let ids = payload
        .and_then(|payload| payload.into_inner().ids)
        .filter(|ids| !ids.is_empty())
        .map(|ids| {
            ids.iter()
                .map(|raw| parse_notification_id(raw))
                .collect::<ApiResult<Vec<Uuid>>>()
        })
        .transpose()?;
    let updated = state.social.mark_read(&user, ids).await?;
    Ok(web::Json(MarkReadResponse { updated }))
}

fn parse_notification_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        field_error(
            FieldName::new("ids"),
            "invalid_uuid",
            format!("notification id '{raw}' must be a valid UUID"),
        )
    })
}

/// Register the social endpoints under `/social`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/social")
            .service(toggle_like)
            .service(list_favorites)
            .service(toggle_favorite)
            .service(delete_comment)
            .service(toggle_follow)
            .service(share_project)
            .service(list_notifications)
            .service(mark_read),
    );
}

#[cfg(test)]
#[path = "social_tests.rs"]
mod tests;
