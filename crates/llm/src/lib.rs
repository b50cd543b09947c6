//! LLM integration
//!
//! Features:
//! - Claude backend over the Anthropic Messages API with SSE streaming
//! - Adapter exposing any backend as the core `LanguageModel` trait
//! - System prompt construction from the service catalog

pub mod adapter;
pub mod backend;
pub mod claude;
pub mod prompt;

pub use adapter::LanguageModelAdapter;
pub use backend::{FinishReason, GenerationOptions, GenerationResult, LlmBackend};
pub use claude::{ClaudeBackend, ClaudeConfig, ClaudeModel};
pub use prompt::{build_chat_request, PromptBuilder};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The consumer stopped reading the token stream
    #[error("Generation cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for lead_agent_core::Error {
    fn from(err: LlmError) -> Self {
        lead_agent_core::Error::Llm(err.to_string())
    }
}
