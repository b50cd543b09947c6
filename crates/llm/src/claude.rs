//! Claude Backend
//!
//! Implements the Anthropic Messages API with server-sent event streaming.
//! Text deltas are forwarded to the caller's channel as they are decoded.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use lead_agent_config::LlmSettings;
use lead_agent_core::{Message, Role};

use crate::backend::{FinishReason, GenerationOptions, GenerationResult, LlmBackend};
use crate::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClaudeModel {
    /// Claude Opus 4.5 - Most capable
    Opus4_5,
    /// Claude Sonnet 4 - Fast and capable
    #[default]
    Sonnet4,
    /// Claude Haiku 3.5 - Fastest
    Haiku3_5,
}

impl ClaudeModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            ClaudeModel::Opus4_5 => "claude-opus-4-5-20251101",
            ClaudeModel::Sonnet4 => "claude-sonnet-4-20250514",
            ClaudeModel::Haiku3_5 => "claude-3-5-haiku-20241022",
        }
    }

    pub fn from_alias(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "opus" | "opus-4.5" | "claude-opus-4-5-20251101" => Some(ClaudeModel::Opus4_5),
            "sonnet" | "sonnet-4" | "claude-sonnet-4-20250514" => Some(ClaudeModel::Sonnet4),
            "haiku" | "haiku-3.5" | "claude-3-5-haiku-20241022" => Some(ClaudeModel::Haiku3_5),
            _ => None,
        }
    }
}

/// Configuration for Claude backend
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    /// API key (from ANTHROPIC_API_KEY or direct). Empty means unconfigured.
    pub api_key: String,
    /// Full model id sent to the API
    pub model: String,
    pub max_tokens: usize,
    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
    pub timeout: Duration,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: ClaudeModel::default().model_id().to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            endpoint: "https://api.anthropic.com".to_string(),
        }
    }
}

impl ClaudeConfig {
    /// Create config with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build from application settings
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self::new(settings.api_key.clone())
            .with_model(&settings.model)
            .with_max_tokens(settings.max_tokens)
            .with_temperature(settings.temperature)
            .with_timeout(Duration::from_secs(settings.timeout_seconds))
            .with_endpoint(settings.endpoint.clone())
    }

    /// Set model from an alias ("sonnet") or a full model id
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = ClaudeModel::from_alias(model)
            .map(|m| m.model_id().to_string())
            .unwrap_or_else(|| model.to_string());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

/// Claude backend
pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    /// Create a new Claude backend
    ///
    /// A missing API key is allowed so the server can start and report
    /// itself unconfigured; generation then fails with a configuration error.
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            tracing::warn!("ANTHROPIC_API_KEY not set, chat generation is disabled");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    /// Convert chat history to Claude messages
    ///
    /// System messages travel in the request's `system` field, and the API
    /// requires the first turn to come from the user.
    fn convert_messages(messages: &[Message]) -> Vec<ClaudeMessage> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .skip_while(|m| m.role == Role::Assistant)
            .map(|m| ClaudeMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Request options override the configured max tokens and temperature
    fn build_request(
        &self,
        system: &str,
        messages: &[Message],
        options: GenerationOptions,
    ) -> ClaudeRequest {
        ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: options
                .max_tokens
                .map(|t| t as usize)
                .unwrap_or(self.config.max_tokens),
            messages: Self::convert_messages(messages),
            system: if system.is_empty() { None } else { Some(system.to_string()) },
            temperature: Some(
                options
                    .temperature
                    .map(|t| t.clamp(0.0, 1.0))
                    .unwrap_or(self.config.temperature),
            ),
            stream: true,
        }
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    async fn generate_stream(
        &self,
        system: &str,
        messages: &[Message],
        options: GenerationOptions,
        tx: mpsc::Sender<String>,
    ) -> Result<GenerationResult, LlmError> {
        if self.config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let start = Instant::now();
        let request = self.build_request(system, messages, options);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut full_text = String::new();
        let mut stop_reason = None;
        let mut output_tokens = 0;
        let mut first_token_ms = None;

        'read: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;

            for event in decoder.push(&chunk) {
                match event {
                    ClaudeStreamEvent::ContentBlockDelta {
                        delta: ClaudeDelta::TextDelta { text },
                    } => {
                        if first_token_ms.is_none() {
                            first_token_ms = Some(start.elapsed().as_millis() as u64);
                        }
                        full_text.push_str(&text);
                        tx.send(text).await.map_err(|_| LlmError::Cancelled)?;
                    }
                    ClaudeStreamEvent::MessageDelta { delta, usage } => {
                        if let Some(reason) = delta.stop_reason {
                            stop_reason = Some(reason);
                        }
                        if let Some(u) = usage {
                            output_tokens = u.output_tokens;
                        }
                    }
                    ClaudeStreamEvent::MessageStop => break 'read,
                    ClaudeStreamEvent::Error { error } => {
                        return Err(LlmError::Api(format!("{}: {}", error.kind, error.message)));
                    }
                    _ => {}
                }
            }
        }

        let Some(stop_reason) = stop_reason else {
            return Err(LlmError::Network(
                "Stream ended before the message completed".to_string(),
            ));
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            model = %self.config.model,
            output_tokens,
            total_time_ms,
            "Claude stream complete"
        );

        Ok(GenerationResult {
            text: full_text,
            tokens: output_tokens,
            time_to_first_token_ms: first_token_ms.unwrap_or(total_time_ms),
            total_time_ms,
            finish_reason: match stop_reason {
                ClaudeStopReason::MaxTokens => FinishReason::Length,
                _ => FinishReason::Stop,
            },
        })
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Incremental decoder for `data:` lines of a server-sent event stream
///
/// Bytes are buffered until a full line is available so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<ClaudeStreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();

            let Some(json_str) = line.strip_prefix("data:") else {
                continue;
            };
            let json_str = json_str.trim_start();
            if json_str.is_empty() || json_str == "[DONE]" {
                continue;
            }

            match serde_json::from_str::<ClaudeStreamEvent>(json_str) {
                Ok(event) => events.push(event),
                Err(e) => tracing::debug!(error = %e, "Skipping undecodable stream event"),
            }
        }

        events
    }
}

// =============================================================================
// Claude API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ClaudeStopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Other,
}

// Streaming event types
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeStreamEvent {
    ContentBlockDelta {
        delta: ClaudeDelta,
    },
    MessageDelta {
        delta: ClaudeMessageDeltaBody,
        usage: Option<ClaudeUsageDelta>,
    },
    MessageStop,
    Error {
        error: ClaudeError,
    },
    /// message_start, content_block_start/stop, ping
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeDelta {
    TextDelta {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeMessageDeltaBody {
    stop_reason: Option<ClaudeStopReason>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsageDelta {
    output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_model_from_alias() {
        assert_eq!(ClaudeModel::from_alias("opus"), Some(ClaudeModel::Opus4_5));
        assert_eq!(ClaudeModel::from_alias("Sonnet"), Some(ClaudeModel::Sonnet4));
        assert_eq!(ClaudeModel::from_alias("haiku"), Some(ClaudeModel::Haiku3_5));
        assert_eq!(ClaudeModel::from_alias("unknown"), None);
    }

    #[test]
    fn test_config_builder() {
        let config = ClaudeConfig::new("test-key")
            .with_model("haiku")
            .with_max_tokens(2048)
            .with_temperature(1.5)
            .with_endpoint("http://localhost:9999/");

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.temperature, 1.0);
        assert_eq!(config.endpoint, "http://localhost:9999");
    }

    #[test]
    fn test_custom_model_id_passes_through() {
        let config = ClaudeConfig::new("k").with_model("claude-custom-2099");
        assert_eq!(config.model, "claude-custom-2099");
    }

    #[test]
    fn test_convert_messages_drops_system_and_leading_assistant() {
        let messages = vec![
            Message::system("sys"),
            Message::assistant("earlier reply"),
            Message::user("hi"),
            Message::assistant("hello"),
        ];
        let converted = ClaudeBackend::convert_messages(&messages);
        assert_eq!(
            converted,
            vec![
                ClaudeMessage { role: "user".to_string(), content: "hi".to_string() },
                ClaudeMessage { role: "assistant".to_string(), content: "hello".to_string() },
            ]
        );
    }

    #[test]
    fn test_request_serialization() {
        let backend = ClaudeBackend::new(ClaudeConfig::new("k")).unwrap();
        let request = backend.build_request(
            "You are helpful",
            &[Message::user("Hello")],
            GenerationOptions::default(),
        );

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["system"], "You are helpful");
        assert_eq!(json["stream"], true);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_request_options_override_config() {
        let backend = ClaudeBackend::new(ClaudeConfig::new("k").with_max_tokens(1024)).unwrap();
        let request = backend.build_request(
            "sys",
            &[Message::user("Hello")],
            GenerationOptions {
                max_tokens: Some(300),
                temperature: Some(0.1),
            },
        );
        assert_eq!(request.max_tokens, 300);
        assert_eq!(request.temperature, Some(0.1));

        let request = backend.build_request(
            "sys",
            &[Message::user("Hello")],
            GenerationOptions {
                max_tokens: None,
                temperature: Some(3.0),
            },
        );
        assert_eq!(request.max_tokens, 1024);
        assert_eq!(request.temperature, Some(1.0));
    }

    #[test]
    fn test_sse_decoder_handles_split_chunks() {
        let mut decoder = SseDecoder::default();
        let part1 = b"event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel";
        let part2 = b"lo\"}}\n\nevent: ping\ndata: {\"type\":\"ping\"}\n\n";

        assert!(decoder.push(part1).is_empty());
        let events = decoder.push(part2);
        assert_eq!(events.len(), 2);
        match &events[0] {
            ClaudeStreamEvent::ContentBlockDelta {
                delta: ClaudeDelta::TextDelta { text },
            } => assert_eq!(text, "Hello"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(matches!(events[1], ClaudeStreamEvent::Other));
    }

    #[test]
    fn test_sse_decoder_multibyte_split() {
        let mut decoder = SseDecoder::default();
        let line = "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"caf\u{e9}\"}}\n";
        let bytes = line.as_bytes();
        let split = line.find('\u{e9}').unwrap() + 1;

        assert!(decoder.push(&bytes[..split]).is_empty());
        let events = decoder.push(&bytes[split..]);
        match &events[0] {
            ClaudeStreamEvent::ContentBlockDelta {
                delta: ClaudeDelta::TextDelta { text },
            } => assert_eq!(text, "caf\u{e9}"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_stream_event_parsing() {
        let delta: ClaudeStreamEvent = serde_json::from_str(
            r#"{"type":"message_delta","delta":{"stop_reason":"max_tokens"},"usage":{"output_tokens":42}}"#,
        )
        .unwrap();
        match delta {
            ClaudeStreamEvent::MessageDelta { delta, usage } => {
                assert_eq!(delta.stop_reason, Some(ClaudeStopReason::MaxTokens));
                assert_eq!(usage.unwrap().output_tokens, 42);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        let error: ClaudeStreamEvent = serde_json::from_str(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap();
        assert!(matches!(error, ClaudeStreamEvent::Error { .. }));

        let start: ClaudeStreamEvent = serde_json::from_str(
            r#"{"type":"message_start","message":{"id":"msg_1","usage":{"input_tokens":10}}}"#,
        )
        .unwrap();
        assert!(matches!(start, ClaudeStreamEvent::Other));
    }

    #[tokio::test]
    async fn test_unconfigured_backend() {
        let backend = ClaudeBackend::new(ClaudeConfig::new("")).unwrap();
        assert!(!backend.is_available().await);

        let (tx, _rx) = mpsc::channel(4);
        let err = backend
            .generate_stream("sys", &[Message::user("hi")], GenerationOptions::default(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
    }
}
