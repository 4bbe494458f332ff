//! Per-user file manager endpoints.
//!
//! ```text
//! GET    /api/files?prefix=
//! PUT    /api/files/{path}
//! GET    /api/files/{path}
//! DELETE /api/files/{path}
//! ```
//!
//! Paths are relative to the caller's root. Uploads are raw request bodies
//! bounded by the configured upload limit.

use actix_web::{HttpResponse, delete, get, put, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::dto::FileMetaResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilesParams {
    /// Only list files under this relative directory.
    pub prefix: Option<String>,
}

/// List the caller's files.
#[utoipa::path(
    get,
    path = "/api/files",
    params(ListFilesParams),
    responses(
        (status = 200, description = "Stored files", body = [FileMetaResponse]),
        (status = 400, description = "Invalid prefix", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "listFiles"
)]
#[get("")]
pub async fn list_files(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<ListFilesParams>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let files: Vec<FileMetaResponse> = state
        .files
        .list(&user, query.into_inner().prefix)
        .await?
        .into_iter()
        .map(FileMetaResponse::from)
        .collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(files))
}

/// Store the request body at `path`, replacing any existing file.
#[utoipa::path(
    put,
    path = "/api/files/{path}",
    params(("path" = String, Path, description = "Relative file path")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Stored", body = FileMetaResponse),
        (status = 400, description = "Invalid path", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 413, description = "Body exceeds the upload limit")
    ),
    tags = ["files"],
    operation_id = "putFile"
)]
#[put("/{path:.+}")]
pub async fn put_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let meta = state.files.put(&user, &path, body.to_vec()).await?;
    Ok(HttpResponse::Created().json(FileMetaResponse::from(meta)))
}

/// Download a file with a content type guessed from its extension.
#[utoipa::path(
    get,
    path = "/api/files/{path}",
    params(("path" = String, Path, description = "Relative file path")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "No such file", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "getFile"
)]
#[get("/{path:.+}")]
pub async fn get_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let file = state.files.get(&user, &path).await?;
    Ok(HttpResponse::Ok()
        .content_type(file.path.content_type())
        .insert_header(private_no_cache_header())
        .body(file.bytes))
}

#[utoipa::path(
    delete,
    path = "/api/files/{path}",
    params(("path" = String, Path, description = "Relative file path")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 404, description = "No such file", body = ErrorSchema)
    ),
    tags = ["files"],
    operation_id = "deleteFile"
)]
#[delete("/{path:.+}")]
pub async fn delete_file(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    state.files.delete(&user, &path).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the file endpoints under `/files` with the given body limit.
pub fn configure(upload_limit: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/files")
                .app_data(web::PayloadConfig::new(upload_limit))
                .service(list_files)
                .service(put_file)
                .service(get_file)
                .service(delete_file),
        );
    }
}
