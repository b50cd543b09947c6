//! LLM Backend trait

use async_trait::async_trait;
use tokio::sync::mpsc;

use lead_agent_core::Message;

use crate::LlmError;

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Full generated text
    pub text: String,
    /// Output tokens reported by the provider
    pub tokens: usize,
    /// Time to first token (ms)
    pub time_to_first_token_ms: u64,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    pub finish_reason: FinishReason,
}

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
    Cancelled,
}

/// Per-request overrides of the backend's configured defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Provider backend
///
/// `generate_stream` sends text deltas into `tx` as they arrive and returns
/// the complete result once the provider finishes. If the receiver is dropped
/// the backend stops and returns `LlmError::Cancelled`.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate with streaming
    async fn generate_stream(
        &self,
        system: &str,
        messages: &[Message],
        options: GenerationOptions,
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError>;

    /// Check if the backend is configured
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}
