//! Language Model traits

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{GenerateRequest, Result, StreamChunk};

/// Streaming language model interface
///
/// Implementations:
/// - `LanguageModelAdapter` over `ClaudeBackend` - Anthropic Messages API
///
/// Dropping the returned stream must cancel the in-flight provider request.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Stream tokens as generated
    ///
    /// Yields text chunks followed by one final chunk. A provider failure is
    /// yielded as an `Err` item and ends the stream.
    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'a>>;

    /// Check if the provider is configured and reachable
    async fn is_available(&self) -> bool;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
