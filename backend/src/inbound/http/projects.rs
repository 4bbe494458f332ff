//! Project endpoints: feed, CRUD, view counting, recommendations and
//! comment threads.
//!
//! ```text
//! GET    /api/projects?limit=20&offset=0&type=external&q=ball
//! POST   /api/projects
//! GET    /api/projects/{id}
//! PATCH  /api/projects/{id}
//! DELETE /api/projects/{id}
//! POST   /api/projects/{id}/view
//! GET    /api/projects/{id}/recommendation
//! GET    /api/projects/{id}/comments
//! POST   /api/projects/{id}/comments {"content":"Nice!","parentId":null}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    CommentBody, CommentId, ExternalSource, FeedQuery, ProjectFile, ProjectInput, ProjectPatch,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    CommentResponse, FeedPageResponse, ProjectDetailResponse, ProjectFileDto, ProjectResponse,
    RecommendationResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    parse_project_id, parse_project_type, social_validation_error,
};

/// Feed query string.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// Page size, default 20, clamped to 1..=50.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// `code`, `external` or `fragment`.
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    /// Case-insensitive title or description search.
    pub q: Option<String>,
}

/// Body for `POST /api/projects`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    #[schema(example = "Bouncing ball")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub files: Vec<ProjectFileDto>,
    pub main_file: Option<String>,
    pub is_public: Option<bool>,
    pub external_url: Option<String>,
    pub external_embed: Option<String>,
    pub external_author: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
}

impl CreateProjectRequest {
    fn into_input(self) -> ApiResult<ProjectInput> {
        Ok(ProjectInput {
            title: self.title,
            description: self.description,
            files: self.files.into_iter().map(ProjectFile::from).collect(),
            main_file: self.main_file,
            is_public: self.is_public.unwrap_or(true),
            external: ExternalSource {
                url: self.external_url,
                embed: self.external_embed,
                author: self.external_author,
            },
            project_type: parse_project_type(self.project_type.as_deref())?,
        })
    }
}

/// Body for `PATCH /api/projects/{id}`. Any external field replaces the
/// whole external source.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub files: Option<Vec<ProjectFileDto>>,
    pub main_file: Option<String>,
    pub is_public: Option<bool>,
    pub external_url: Option<String>,
    pub external_embed: Option<String>,
    pub external_author: Option<String>,
}

impl From<UpdateProjectRequest> for ProjectPatch {
    fn from(value: UpdateProjectRequest) -> Self {
        let touches_external = value.external_url.is_some()
            || value.external_embed.is_some()
            || value.external_author.is_some();
        Self {
            title: value.title,
            description: value.description,
            files: value
                .files
                .map(|files| files.into_iter().map(ProjectFile::from).collect()),
            main_file: value.main_file,
            is_public: value.is_public,
            external: touches_external.then(|| ExternalSource {
                url: value.external_url,
                embed: value.external_embed,
                author: value.external_author,
            }),
        }
    }
}

/// Body for `POST /api/projects/{id}/comments`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ViewsResponse {
    pub views: i64,
}

/// Public feed, newest first.
#[utoipa::path(
    get,
    path = "/api/projects",
    params(FeedParams),
    responses(
        (status = 200, description = "Feed page", body = FeedPageResponse),
        (status = 400, description = "Invalid filter", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "listFeed",
    security([])
)]
#[get("")]
pub async fn list_feed(
    state: web::Data<HttpState>,
    query: web::Query<FeedParams>,
) -> ApiResult<web::Json<FeedPageResponse>> {
    let params = query.into_inner();
    let feed = FeedQuery::new(params.limit, params.offset)
        .with_type(parse_project_type(params.project_type.as_deref())?)
        .with_search(params.q);
    let page = state.projects.feed(feed).await?;
    Ok(web::Json(page.into()))
}

/// Create a project owned by the signed-in user.
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Created", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "createProject"
)]
#[post("")]
pub async fn create_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let input = payload.into_inner().into_input()?;
    let project = state.projects.create(&author, input).await?;
    Ok(HttpResponse::Created().json(ProjectResponse::from(project)))
}

/// Project detail with counters and the viewer's like/favourite state.
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = ProjectDetailResponse),
        (status = 404, description = "Missing or private", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "getProject",
    security([])
)]
#[get("/{id}")]
pub async fn get_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProjectDetailResponse>> {
    let id = parse_project_id(&path)?;
    let detail = state.projects.detail(&id, session.user_id()?).await?;
    Ok(web::Json(detail.into()))
}

/// Update a project; only its author may do so.
#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated", body = ProjectResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "updateProject"
)]
#[patch("/{id}")]
pub async fn update_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateProjectRequest>,
) -> ApiResult<web::Json<ProjectResponse>> {
    let actor = session.require_user_id()?;
    let id = parse_project_id(&path)?;
    let project = state
        .projects
        .update(&id, &actor, payload.into_inner().into())
        .await?;
    Ok(web::Json(project.into()))
}

/// Delete a project; only its author may do so.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 403, description = "Not the author", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "deleteProject"
)]
#[delete("/{id}")]
pub async fn delete_project(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let id = parse_project_id(&path)?;
    state.projects.delete(&id, &actor).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Count a view and return the new total.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/view",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "View counted", body = ViewsResponse),
        (status = 404, description = "Unknown or private project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "recordView",
    security([])
)]
#[post("/{id}/view")]
pub async fn record_view(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ViewsResponse>> {
    let id = parse_project_id(&path)?;
    let views = state.projects.record_view(&id, session.user_id()?).await?;
    debug!(project_id = %id, views, "view recorded");
    Ok(web::Json(ViewsResponse { views }))
}

/// Pick another public project to watch next.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/recommendation",
    params(("id" = String, Path, description = "Current project id")),
    responses(
        (status = 200, description = "Recommendation", body = RecommendationResponse),
        (status = 404, description = "Nothing to recommend", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "recommendProject",
    security([])
)]
#[get("/{id}/recommendation")]
pub async fn recommend(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RecommendationResponse>> {
    let id = parse_project_id(&path)?;
    let recommendation = state.recommender.recommend(&id).await?;
    Ok(web::Json(recommendation.into()))
}

/// Comment threads: roots oldest first with nested replies.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/comments",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Comment threads", body = [CommentResponse]),
        (status = 404, description = "Missing or private project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "listComments",
    security([])
)]
#[get("/{id}/comments")]
pub async fn list_comments(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<CommentResponse>>> {
    let id = parse_project_id(&path)?;
    let threads = state.social.comments(&id, session.user_id()?).await?;
    Ok(web::Json(
        threads.into_iter().map(CommentResponse::from).collect(),
    ))
}

/// Comment on a project or reply to one of its comments.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/comments",
    params(("id" = String, Path, description = "Project id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "Unknown project", body = ErrorSchema)
    ),
    tags = ["projects"],
    operation_id = "addComment"
)]
#[post("/{id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let author = session.require_user_id()?;
    let id = parse_project_id(&path)?;
    let CommentRequest { content, parent_id } = payload.into_inner();
    let content = CommentBody::new(&content).map_err(social_validation_error)?;
    let parent = parent_id
        .as_deref()
        .map(CommentId::new)
        .transpose()
        .map_err(social_validation_error)?;
    let comment = state
        .social
        .add_comment(&author, &id, content, parent)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

/// Register the project endpoints under `/projects`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .service(list_feed)
            .service(create_project)
            .service(get_project)
            .service(update_project)
            .service(delete_project)
            .service(record_view)
            .service(recommend)
            .service(list_comments)
            .service(add_comment),
    );
}

#[cfg(test)]
#[path = "projects_tests.rs"]
mod tests;
