//! User profile endpoints.
//!
//! ```text
//! GET   /api/users/{id}
//! PATCH /api/users/me {"name":"Ada","bio":null}
//! GET   /api/users/{id}/projects
//! ```

use actix_web::{get, patch, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{DisplayName, ProfileUpdate, validate_avatar, validate_bio};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{ProfileResponse, ProjectResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{nullable, parse_user_id, user_validation_error};

/// Body for `PATCH /api/users/me`. `null` or an empty string clears
/// `avatar` and `bio`; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatchRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub avatar: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
}

impl TryFrom<ProfilePatchRequest> for ProfileUpdate {
    type Error = crate::domain::UserValidationError;

    fn try_from(value: ProfilePatchRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.map(DisplayName::new).transpose()?,
            avatar: value
                .avatar
                .map(|avatar| validate_avatar(avatar.as_deref()))
                .transpose()?,
            bio: value
                .bio
                .map(|bio| validate_bio(bio.as_deref()))
                .transpose()?,
        })
    }
}

/// Public profile with follower, following and project counts.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getProfile",
    security([])
)]
#[get("/{id}")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let id = parse_user_id(&path)?;
    let viewer = session.user_id()?;
    let own = viewer.as_ref() == Some(&id);
    let profile = state.accounts.profile(&id, viewer).await?;
    Ok(web::Json(ProfileResponse::new(profile, own)))
}

/// Update the signed-in user's profile.
#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = ProfilePatchRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[patch("/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfilePatchRequest>,
) -> ApiResult<web::Json<ProfileResponse>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from(payload.into_inner()).map_err(user_validation_error)?;
    state.accounts.update_profile(&user_id, update).await?;
    let profile = state
        .accounts
        .profile(&user_id, Some(user_id.clone()))
        .await?;
    Ok(web::Json(ProfileResponse::new(profile, true)))
}

/// Projects authored by a user; private ones only for the owner.
#[utoipa::path(
    get,
    path = "/api/users/{id}/projects",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Projects", body = [ProjectResponse]),
        (status = 400, description = "Invalid id", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUserProjects",
    security([])
)]
#[get("/{id}/projects")]
pub async fn list_user_projects(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ProjectResponse>>> {
    let id = parse_user_id(&path)?;
    let projects = state.projects.by_author(&id, session.user_id()?).await?;
    Ok(web::Json(
        projects.into_iter().map(ProjectResponse::from).collect(),
    ))
}

/// Register the user endpoints under `/users`; `/me` precedes `/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(update_profile)
            .service(list_user_projects)
            .service(get_profile),
    );
}
