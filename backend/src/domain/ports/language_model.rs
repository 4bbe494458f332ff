//! Port for streaming chat completions from a language model provider.
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::ModelSpec;

use super::define_port_error;

define_port_error! {
    /// Errors raised by language model adapters.
    pub enum LanguageModelError {
        /// The provider has no credentials or endpoint configured.
        NotConfigured { provider: String } => "model provider '{provider}' is not configured",
        /// The provider could not be reached.
        Transport { message: String } => "model provider request failed: {message}",
        /// The provider answered with a non-success status.
        Status { status: u16, message: String } => "model provider returned status {status}: {message}",
        /// The streamed payload could not be decoded.
        Decode { message: String } => "model provider response could not be decoded: {message}",
    }
}

/// Stream of text deltas produced by a provider.
pub type TextStream = BoxStream<'static, Result<String, LanguageModelError>>;

/// Chat completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: ModelSpec,
    pub system: String,
    pub prompt: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Whether requests for `provider` can be served.
    fn is_configured(&self, provider: &str) -> bool;

    /// Start a streaming completion.
    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, LanguageModelError>;
}

/// Model adapter used when no provider is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredLanguageModel;

#[async_trait]
impl LanguageModel for UnconfiguredLanguageModel {
    fn is_configured(&self, _provider: &str) -> bool {
        false
    }

    async fn stream(&self, request: CompletionRequest) -> Result<TextStream, LanguageModelError> {
        Err(LanguageModelError::not_configured(request.model.provider))
    }
}
