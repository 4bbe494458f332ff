//! Code generation endpoints.
//!
//! `POST /api/ai/generate` answers with `text/event-stream`: one
//! `data: <json>` frame per [`GenerationEvent`], then `data: [DONE]`.
//! Validation and model-selection failures are returned as ordinary JSON
//! errors before the stream starts.

use std::convert::Infallible;

use actix_web::web::Bytes;
use actix_web::{HttpResponse, get, http::header, post, web};
use futures_util::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::domain::{GenerationEvent, GenerationRequest, TEMPLATES, Template};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::generation_validation_error;

const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// Body for `POST /api/ai/generate`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    #[schema(example = "A bouncing ball on a canvas")]
    pub prompt: String,
    /// Defaults to `html`.
    #[schema(example = "html")]
    pub template_id: Option<String>,
    /// Save the fragment to the caller's files when signed in.
    #[serde(default)]
    pub save: bool,
}

/// Generation template as listed to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    #[schema(example = "react")]
    pub id: String,
    pub name: String,
    pub language: String,
    pub file_name: String,
}

impl From<&Template> for TemplateResponse {
    fn from(value: &Template) -> Self {
        Self {
            id: value.id.to_owned(),
            name: value.name.to_owned(),
            language: value.language.to_owned(),
            file_name: value.file_name.to_owned(),
        }
    }
}

/// Encode one event as an SSE `data:` frame.
pub(crate) fn sse_frame(event: &GenerationEvent) -> Bytes {
    match serde_json::to_string(event) {
        Ok(json) => Bytes::from(format!("data: {json}\n\n")),
        Err(err) => {
            error!(error = %err, "failed to encode generation event");
            Bytes::from_static(b"data: {\"type\":\"error\",\"message\":\"failed to encode event\"}\n\n")
        }
    }
}

/// Stream a generated code fragment.
#[utoipa::path(
    post,
    path = "/api/ai/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Server-sent generation events", content_type = "text/event-stream", body = String),
        (status = 400, description = "Invalid prompt or template", body = ErrorSchema),
        (status = 503, description = "No language model configured", body = ErrorSchema)
    ),
    tags = ["ai"],
    operation_id = "generateCode",
    security([])
)]
#[post("/generate")]
pub async fn generate(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<GenerateRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let request =
        GenerationRequest::try_new(&payload.prompt, payload.template_id.as_deref(), payload.save)
            .map_err(generation_validation_error)?;
    let user = session.user_id()?;
    info!(
        template = request.template().id,
        save = request.save(),
        signed_in = user.is_some(),
        "starting code generation"
    );

    let events = state.generator.generate(request, user).await?;
    let frames = events
        .map(|event| Ok::<_, Infallible>(sse_frame(&event)))
        .chain(stream::once(async {
            Ok::<_, Infallible>(Bytes::from_static(DONE_FRAME))
        }));

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(frames))
}

/// Templates accepted by `POST /api/ai/generate`, default first.
#[utoipa::path(
    get,
    path = "/api/ai/templates",
    responses((status = 200, description = "Templates", body = [TemplateResponse])),
    tags = ["ai"],
    operation_id = "listTemplates",
    security([])
)]
#[get("/templates")]
pub async fn list_templates() -> web::Json<Vec<TemplateResponse>> {
    web::Json(TEMPLATES.iter().map(TemplateResponse::from).collect())
}

/// Register the AI endpoints under `/ai`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ai")
            .service(generate)
            .service(list_templates),
    );
}
