//! Driving port for streamed code generation.
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{Error, GenerationEvent, GenerationRequest, UserId};

/// Ordered generation frames; the stream ends after `complete` or `error`.
pub type GenerationStream = BoxStream<'static, GenerationEvent>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Start a generation. Errors returned here happen before any frame is
    /// produced (for example no model is configured); later failures are
    /// reported in-band as an `error` frame.
    async fn generate(
        &self,
        request: GenerationRequest,
        user: Option<UserId>,
    ) -> Result<GenerationStream, Error>;
}
