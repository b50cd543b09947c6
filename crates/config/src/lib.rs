//! Configuration management for the lead agent
//!
//! Supports loading configuration from:
//! - YAML/TOML files (config/default, config/{env})
//! - Environment variables (LEAD_AGENT__ prefix, `__` separator)
//!
//! # Domain Configuration
//!
//! Lead qualification tables live next to the settings files:
//! - scoring.yaml - Component weights and thresholds
//! - extraction.yaml - Keyword tables and bucket boundaries
//! - services.yaml - Service catalog and estimate ranges
//!
//! Missing files fall back to built-in defaults.

pub mod domain;
pub mod settings;

pub use domain::{
    AuthorityKeywords, AuthorityPoints, BudgetKeywords, BudgetPoints, CompanySizeKeywords,
    EngagementPoints, ExtractionConfig, LeadConfig, PriceRange, QualificationThresholds,
    ScopeKeywords, ScopePoints, ScoringConfig, ServiceCatalog, ServiceDefinition,
    SizeMultipliers, TimelineKeywords, TimelinePoints, UrgencyKeywords, WeekRange,
};
pub use settings::{
    load_settings, load_settings_from, ConversationConfig, LlmSettings, ObservabilityConfig,
    RateLimitConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
