//! Reqwest-backed adapter for OpenAI-compatible chat completion APIs.
//!
//! The adapter owns transport details only: request serialisation, bearer
//! authentication, HTTP status mapping and decoding of the provider's event
//! stream into text deltas. Event framing is handled by
//! `reqwest-eventsource`; reconnects are disabled.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::{Client, StatusCode, Url};
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{ChatChunkDto, ChatMessageDto, ChatRequestDto};
use crate::domain::ports::{CompletionRequest, LanguageModel, LanguageModelError, TextStream};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Payload closing an OpenAI-style stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Errors raised while constructing the adapter.
#[derive(Debug, thiserror::Error)]
pub enum ModelClientBuildError {
    /// The configured base URL is not a valid absolute URL.
    #[error("invalid model base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },
    /// The HTTP client could not be built.
    #[error("failed to build model HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Streaming chat completion client for one provider.
pub struct OpenAiCompatibleModel {
    client: Client,
    provider: String,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl OpenAiCompatibleModel {
    /// Build a client posting to `<base_url>/chat/completions`.
    ///
    /// ```rust,ignore
    /// let model = OpenAiCompatibleModel::new(
    ///     "openai",
    ///     "https://api.openai.com/v1",
    ///     Zeroizing::new(api_key),
    /// )?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ModelClientBuildError`] when the base URL does not parse or
    /// the reqwest client cannot be constructed.
    pub fn new(
        provider: impl Into<String>,
        base_url: &str,
        api_key: Zeroizing<String>,
    ) -> Result<Self, ModelClientBuildError> {
        let endpoint = completions_endpoint(base_url)?;
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            provider: provider.into().to_ascii_lowercase(),
            endpoint,
            api_key,
        })
    }
}

fn completions_endpoint(base_url: &str) -> Result<Url, ModelClientBuildError> {
    let joined = format!("{}/chat/completions", base_url.trim().trim_end_matches('/'));
    Url::parse(&joined).map_err(|err| ModelClientBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        message: err.to_string(),
    })
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    fn is_configured(&self, provider: &str) -> bool {
        provider.eq_ignore_ascii_case(&self.provider)
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, LanguageModelError> {
        if !self.is_configured(&request.model.provider) {
            return Err(LanguageModelError::not_configured(request.model.provider));
        }
        let body = ChatRequestDto {
            model: &request.model.model,
            stream: true,
            messages: [
                ChatMessageDto {
                    role: "system",
                    content: &request.system,
                },
                ChatMessageDto {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };
        let builder = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&body);
        let mut source = EventSource::new(builder)
            .map_err(|err| LanguageModelError::transport(err.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        // The first event is either `Open` or the connection failure.
        let first = match source.next().await {
            Some(Err(err)) => return Err(open_error(err).await),
            Some(Ok(event)) => frame(Ok(event)),
            None => Ok(Frame::End),
        };
        debug!(model = %request.model, "model stream opened");

        let frames = stream::once(async move { first }).chain(source.map(frame));
        Ok(text_deltas(frames))
    }
}

/// Provider stream item after event framing.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Open,
    Data(String),
    End,
}

fn frame(item: Result<Event, EventSourceError>) -> Result<Frame, LanguageModelError> {
    match item {
        Ok(Event::Open) => Ok(Frame::Open),
        Ok(Event::Message(message)) => Ok(Frame::Data(message.data)),
        Err(EventSourceError::StreamEnded) => Ok(Frame::End),
        Err(err) => Err(map_source_error(err)),
    }
}

/// Turn provider frames into text deltas, ending at `[DONE]`, at the end of
/// the stream or after the first error.
fn text_deltas<S>(frames: S) -> TextStream
where
    S: Stream<Item = Result<Frame, LanguageModelError>> + Send + 'static,
{
    stream::unfold(Some(frames.boxed()), |frames| async move {
        let mut frames = frames?;
        loop {
            match frames.next().await? {
                Ok(Frame::Open) => {}
                Ok(Frame::End) => return None,
                Ok(Frame::Data(data)) if data.trim() == DONE_SENTINEL => return None,
                Ok(Frame::Data(data)) => {
                    return match decode_chunk(&data) {
                        Ok(text) => Some((Ok(text), Some(frames))),
                        Err(err) => Some((Err(err), None)),
                    };
                }
                Err(err) => return Some((Err(err), None)),
            }
        }
    })
    .boxed()
}

fn decode_chunk(json: &str) -> Result<String, LanguageModelError> {
    let chunk: ChatChunkDto = serde_json::from_str(json)
        .map_err(|err| LanguageModelError::decode(format!("invalid stream chunk: {err}")))?;
    chunk.into_text().map_err(LanguageModelError::transport)
}

fn map_transport_error(error: reqwest::Error) -> LanguageModelError {
    if error.is_timeout() {
        LanguageModelError::transport(format!("timed out: {error}"))
    } else {
        LanguageModelError::transport(error.to_string())
    }
}

/// Map a failure seen while opening the stream, reading the error body.
async fn open_error(error: EventSourceError) -> LanguageModelError {
    match error {
        EventSourceError::InvalidStatusCode(status, response) => {
            let body = response.bytes().await.unwrap_or_default();
            map_status_error(status, body.as_ref())
        }
        other => map_source_error(other),
    }
}

fn map_source_error(error: EventSourceError) -> LanguageModelError {
    match error {
        EventSourceError::Transport(err) => map_transport_error(err),
        EventSourceError::InvalidStatusCode(status, _) => map_status_error(status, &[]),
        EventSourceError::Utf8(err) => LanguageModelError::decode(err.to_string()),
        EventSourceError::Parser(err) => LanguageModelError::decode(err.to_string()),
        other => LanguageModelError::transport(other.to_string()),
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> LanguageModelError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        preview
    };
    LanguageModelError::status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
