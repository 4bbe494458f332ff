//! Streaming code-generation relay.
//!
//! The service picks the first configured model from the preference list,
//! relays provider deltas as `chunk` frames with periodic `progress` frames,
//! and finishes with a `complete` frame carrying the extracted fragment. Any
//! provider failure becomes a single `error` frame that ends the stream.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ports::{
    BlobStore, CodeGenerator, CompletionRequest, GenerationStream, LanguageModel,
    LanguageModelError, TextStream,
};
use crate::domain::{
    BlobPath, CodeFragment, DEFAULT_PROGRESS_INTERVAL, Error, GenerationEvent, GenerationRequest,
    ModelSpec, UserId, extract_code, select_model, system_prompt,
};

/// Code generation service implementing [`CodeGenerator`].
pub struct GenerationService<M: ?Sized, B> {
    model: Arc<M>,
    blobs: Arc<B>,
    preferences: Arc<[ModelSpec]>,
    progress_interval: usize,
}

impl<M: ?Sized, B> Clone for GenerationService<M, B> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            blobs: Arc::clone(&self.blobs),
            preferences: Arc::clone(&self.preferences),
            progress_interval: self.progress_interval,
        }
    }
}

impl<M: ?Sized, B> GenerationService<M, B> {
    pub fn new(model: Arc<M>, blobs: Arc<B>, preferences: Vec<ModelSpec>) -> Self {
        Self {
            model,
            blobs,
            preferences: preferences.into(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Emit a `progress` frame every `interval` chunks; zero is treated as one.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }
}

enum Phase {
    Start,
    Connect,
    Relay(TextStream),
    Finish,
    Done,
}

/// State threaded through the generated event stream.
struct Relay<M: ?Sized, B> {
    model: Arc<M>,
    blobs: Arc<B>,
    completion: CompletionRequest,
    request: GenerationRequest,
    user: Option<UserId>,
    progress_interval: usize,
    phase: Phase,
    pending: VecDeque<GenerationEvent>,
    text: String,
    chunks: usize,
    characters: usize,
}

impl<M, B> Relay<M, B>
where
    M: LanguageModel + ?Sized + 'static,
    B: BlobStore + 'static,
{
    async fn next_event(mut self) -> Option<(GenerationEvent, Self)> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event.is_terminal() {
                    self.pending.clear();
                    self.phase = Phase::Done;
                }
                return Some((event, self));
            }
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Start => {
                    self.pending.push_back(GenerationEvent::Start {
                        model: self.completion.model.to_string(),
                        template_id: self.request.template().id.to_owned(),
                    });
                    self.phase = Phase::Connect;
                }
                Phase::Connect => match self.model.stream(self.completion.clone()).await {
                    Ok(deltas) => self.phase = Phase::Relay(deltas),
                    Err(err) => self.fail(&err),
                },
                Phase::Relay(mut deltas) => match deltas.next().await {
                    Some(Ok(delta)) => {
                        self.push_delta(delta);
                        self.phase = Phase::Relay(deltas);
                    }
                    Some(Err(err)) => self.fail(&err),
                    None => self.phase = Phase::Finish,
                },
                Phase::Finish => {
                    let event = self.complete().await;
                    self.pending.push_back(event);
                }
                Phase::Done => return None,
            }
        }
    }

    fn push_delta(&mut self, delta: String) {
        if delta.is_empty() {
            return;
        }
        self.chunks += 1;
        self.characters += delta.chars().count();
        self.text.push_str(&delta);
        self.pending.push_back(GenerationEvent::Chunk { content: delta });
        if self.chunks % self.progress_interval == 0 {
            self.pending.push_back(GenerationEvent::Progress {
                chunks: self.chunks,
                characters: self.characters,
            });
        }
    }

    fn fail(&mut self, err: &LanguageModelError) {
        warn!(model = %self.completion.model, error = %err, "generation failed");
        self.pending.push_back(GenerationEvent::Error {
            message: err.to_string(),
        });
    }

    async fn complete(&mut self) -> GenerationEvent {
        if self.text.trim().is_empty() {
            warn!(model = %self.completion.model, "model returned an empty response");
            return GenerationEvent::Error {
                message: "the model returned an empty response".to_owned(),
            };
        }
        let template = self.request.template();
        let extracted = extract_code(&self.text, template);
        let id = Uuid::new_v4();
        let saved_path = match (self.user.clone(), self.request.save()) {
            (Some(user), true) => self.save(&user, &id, &extracted.code).await,
            (None, true) => {
                debug!(fragment_id = %id, "anonymous generation; skipping save");
                None
            }
            _ => None,
        };
        info!(
            fragment_id = %id,
            template = template.id,
            chunks = self.chunks,
            characters = self.characters,
            "generation complete"
        );
        GenerationEvent::Complete {
            fragment: CodeFragment {
                id,
                template_id: template.id.to_owned(),
                language: extracted.language,
                file_name: template.file_name.to_owned(),
                code: extracted.code,
                description: extracted.description,
                saved_path,
            },
        }
    }

    /// Store the fragment; returns the path relative to the user root.
    async fn save(&mut self, user: &UserId, id: &Uuid, code: &str) -> Option<String> {
        let file_name = self.request.template().file_name;
        let path = match BlobPath::fragment_file(user, id, file_name) {
            Ok(path) => path,
            Err(err) => {
                warn!(fragment_id = %id, error = %err, "invalid fragment path");
                return None;
            }
        };
        match self.blobs.put(&path, code.as_bytes().to_vec()).await {
            Ok(meta) => meta
                .path
                .strip_prefix(&BlobPath::user_root(user))
                .map(str::to_owned),
            Err(err) => {
                warn!(fragment_id = %id, path = %path, error = %err, "failed to save fragment");
                None
            }
        }
    }
}

#[async_trait]
impl<M, B> CodeGenerator for GenerationService<M, B>
where
    M: LanguageModel + ?Sized + 'static,
    B: BlobStore + 'static,
{
    async fn generate(
        &self,
        request: GenerationRequest,
        user: Option<UserId>,
    ) -> Result<GenerationStream, Error> {
        let model = select_model(&self.preferences, |provider| {
            self.model.is_configured(provider)
        })
        .cloned()
        .ok_or_else(|| Error::service_unavailable("no language model is configured"))?;

        let completion = CompletionRequest {
            model,
            system: system_prompt(request.template()),
            prompt: request.prompt().to_owned(),
        };
        let relay = Relay {
            model: Arc::clone(&self.model),
            blobs: Arc::clone(&self.blobs),
            completion,
            request,
            user,
            progress_interval: self.progress_interval,
            phase: Phase::Start,
            pending: VecDeque::new(),
            text: String::new(),
            chunks: 0,
            characters: 0,
        };
        Ok(stream::unfold(relay, Relay::next_event).boxed())
    }
}

#[cfg(test)]
#[path = "generation_service_tests.rs"]
mod tests;
