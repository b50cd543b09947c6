//! Streaming chat orchestration
//!
//! One chat turn: validate, persist the user message, load context, stream
//! the model's reply as events, persist the reply and kick off background
//! analysis once the session is long enough.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lead_agent_config::{ConversationConfig, LlmSettings};
use lead_agent_core::{Error, LanguageModel, NewMessage, Result};
use lead_agent_llm::build_chat_request;
use lead_agent_persistence::ConversationStore;

use crate::analysis::LeadAnalyzer;

/// Incoming chat message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Events streamed back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Token {
        content: String,
    },
    Done {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
    },
    Error {
        error: String,
    },
}

/// Stage of a chat turn, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Received,
    ContextLoaded,
    Streaming,
    Persisting,
    Analyzing,
    Done,
    Error,
}

impl ChatPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatPhase::Received => "received",
            ChatPhase::ContextLoaded => "context_loaded",
            ChatPhase::Streaming => "streaming",
            ChatPhase::Persisting => "persisting",
            ChatPhase::Analyzing => "analyzing",
            ChatPhase::Done => "done",
            ChatPhase::Error => "error",
        }
    }
}

pub type ChatStream = Pin<Box<dyn Stream<Item = ChatEvent> + Send>>;

/// Message shown to the client when generation fails
const GENERATION_FAILED: &str = "Failed to generate response. Please try again.";

/// Drives one chat turn end to end
pub struct ChatOrchestrator {
    store: Arc<dyn ConversationStore>,
    llm: Arc<dyn LanguageModel>,
    analyzer: Arc<LeadAnalyzer>,
    system_prompt: Arc<str>,
    llm_settings: LlmSettings,
    config: ConversationConfig,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        llm: Arc<dyn LanguageModel>,
        analyzer: Arc<LeadAnalyzer>,
        system_prompt: impl Into<Arc<str>>,
        llm_settings: LlmSettings,
        config: ConversationConfig,
    ) -> Self {
        Self {
            store,
            llm,
            analyzer,
            system_prompt: system_prompt.into(),
            llm_settings,
            config,
        }
    }

    /// Trimmed message, or a validation error
    pub fn validate<'r>(&self, request: &'r ChatRequest) -> Result<&'r str> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(Error::validation("Message is required"));
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(Error::validation(format!(
                "Message is too long (maximum {} characters)",
                self.config.max_message_length
            )));
        }
        Ok(message)
    }

    /// Start a chat turn
    ///
    /// Validation and store failures are returned before anything is
    /// streamed. Provider failures arrive as a `ChatEvent::Error`.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatStream> {
        let message = self.validate(&request)?.to_string();

        let session_id = request
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::debug!(
            session_id = %session_id,
            phase = ChatPhase::Received.as_str(),
            chars = message.chars().count(),
            "Chat message received"
        );

        self.store
            .append(&session_id, NewMessage::user(message).with_metadata(request.metadata))
            .await?;

        let context = self
            .store
            .get_context(&session_id, self.config.max_messages_in_context)
            .await?;
        let generate = build_chat_request(&self.system_prompt, &context, &self.llm_settings);

        tracing::debug!(
            session_id = %session_id,
            phase = ChatPhase::ContextLoaded.as_str(),
            messages = context.len(),
            "Context loaded"
        );

        let llm = self.llm.clone();
        let store = self.store.clone();
        let analyzer = self.analyzer.clone();
        let min_messages = self.config.min_messages_for_analysis;

        Ok(Box::pin(async_stream::stream! {
            tracing::debug!(
                session_id = %session_id,
                phase = ChatPhase::Streaming.as_str(),
                model = llm.model_name(),
                "Streaming response"
            );

            let mut response = String::new();
            let mut failure = None;
            {
                let mut tokens = llm.generate_stream(generate);
                while let Some(chunk) = tokens.next().await {
                    match chunk {
                        Ok(chunk) => {
                            if !chunk.delta.is_empty() {
                                response.push_str(&chunk.delta);
                                yield ChatEvent::Token { content: chunk.delta };
                            }
                            if chunk.is_final {
                                break;
                            }
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
            }

            if let Some(e) = failure {
                tracing::error!(
                    session_id = %session_id,
                    phase = ChatPhase::Error.as_str(),
                    error = %e,
                    "Generation failed"
                );
                yield ChatEvent::Error { error: GENERATION_FAILED.to_string() };
                return;
            }

            tracing::debug!(
                session_id = %session_id,
                phase = ChatPhase::Persisting.as_str(),
                chars = response.len(),
                "Persisting response"
            );

            let appended = store.append(&session_id, NewMessage::assistant(response)).await;
            let message_id = match appended {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(
                        session_id = %session_id,
                        phase = ChatPhase::Error.as_str(),
                        error = %e,
                        "Failed to persist response"
                    );
                    yield ChatEvent::Error { error: "Failed to save response".to_string() };
                    return;
                }
            };

            match store.message_count(&session_id).await {
                Ok(count) if count >= min_messages => {
                    tracing::debug!(
                        session_id = %session_id,
                        phase = ChatPhase::Analyzing.as_str(),
                        messages = count,
                        "Scheduling lead analysis"
                    );
                    analyzer.spawn(session_id.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to count messages"
                    );
                }
            }

            tracing::info!(
                session_id = %session_id,
                phase = ChatPhase::Done.as_str(),
                message_id = %message_id,
                "Chat turn complete"
            );
            yield ChatEvent::Done { session_id, message_id };
        }))
    }
}
