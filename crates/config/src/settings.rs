//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation
    #[default]
    Development,
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Conversation handling limits
    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Directory holding scoring.yaml, extraction.yaml and services.yaml
    #[serde(default = "default_lead_config_dir")]
    pub lead_config_dir: String,
}

fn default_lead_config_dir() -> String {
    "config".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            server: ServerConfig::default(),
            llm: LlmSettings::default(),
            conversation: ConversationConfig::default(),
            observability: ObservabilityConfig::default(),
            lead_config_dir: default_lead_config_dir(),
        }
    }
}

impl Settings {
    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_conversation()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.rate_limit.enabled && server.rate_limit.requests_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.rate_limit.requests_per_minute".to_string(),
                message: "Must be greater than 0 when rate limiting is enabled".to_string(),
            });
        }

        if self.environment.is_production() && !server.cors_enabled {
            tracing::warn!("CORS is disabled in production");
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if !(0.0..=1.0).contains(&llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", llm.temperature),
            });
        }

        if llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.environment.is_production() && llm.api_key.is_empty() {
            return Err(ConfigError::MissingField("llm.api_key".to_string()));
        }

        Ok(())
    }

    fn validate_conversation(&self) -> Result<(), ConfigError> {
        let conversation = &self.conversation;

        if conversation.max_message_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.max_message_length".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if conversation.max_messages_in_context == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.max_messages_in_context".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if conversation.sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "conversation.sweep_interval_seconds".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Per-client rate limiting for the chat and lead endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sustained requests per minute per client
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Requests a client may make back to back before throttling
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_requests_per_minute() -> u32 {
    20
}

fn default_burst() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: default_requests_per_minute(),
            burst: default_burst(),
        }
    }
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API key (falls back to ANTHROPIC_API_KEY)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Model alias or full model id
    #[serde(default = "default_model")]
    pub model: String,

    /// API endpoint (for testing or proxy)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

fn default_api_key() -> String {
    std::env::var("ANTHROPIC_API_KEY").unwrap_or_default()
}

fn default_model() -> String {
    "sonnet".to_string()
}

fn default_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tokens() -> usize {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            model: default_model(),
            endpoint: default_endpoint(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl LlmSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Conversation handling limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Messages sent to the model per turn
    #[serde(default = "default_max_messages_in_context")]
    pub max_messages_in_context: usize,

    /// Maximum user message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Session size at which background lead analysis starts
    #[serde(default = "default_min_messages_for_analysis")]
    pub min_messages_for_analysis: usize,

    /// Active sessions idle this long are marked abandoned
    #[serde(default = "default_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,

    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_max_messages_in_context() -> usize {
    50
}

fn default_max_message_length() -> usize {
    4000
}

fn default_min_messages_for_analysis() -> usize {
    4
}

fn default_idle_timeout_minutes() -> u64 {
    30
}

fn default_sweep_interval_seconds() -> u64 {
    300
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_messages_in_context: default_max_messages_in_context(),
            max_message_length: default_max_message_length(),
            min_messages_for_analysis: default_min_messages_for_analysis(),
            idle_timeout_minutes: default_idle_timeout_minutes(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Install the Prometheus recorder and expose /metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority: env vars > config/{env} > config/default > defaults
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Load settings from a specific config directory
pub fn load_settings_from(config_dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder =
        builder.add_source(File::with_name(&format!("{}/default", config_dir)).required(false));

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&format!("{}/{}", config_dir, env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("LEAD_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
