//! Lead Scoring Configuration
//!
//! Points awarded per detected signal and the qualification thresholds.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Scoring configuration loaded from scoring.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub thresholds: QualificationThresholds,
    #[serde(default)]
    pub budget: BudgetPoints,
    #[serde(default)]
    pub timeline: TimelinePoints,
    #[serde(default)]
    pub authority: AuthorityPoints,
    #[serde(default)]
    pub scope: ScopePoints,
    #[serde(default)]
    pub engagement: EngagementPoints,
}

impl ScoringConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;

        for (field, value) in [
            ("thresholds.minimum_score", t.minimum_score),
            ("thresholds.medium_score", t.medium_score),
            ("thresholds.min_confidence_for_nurture", t.min_confidence_for_nurture),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0 and 100, got {}", value),
                });
            }
        }

        if t.medium_score > t.minimum_score {
            return Err(ConfigError::InvalidValue {
                field: "thresholds.medium_score".to_string(),
                message: format!(
                    "Must not exceed minimum_score ({}), got {}",
                    t.minimum_score, t.medium_score
                ),
            });
        }

        if self.engagement.medium_message_count > self.engagement.high_message_count {
            return Err(ConfigError::InvalidValue {
                field: "engagement.medium_message_count".to_string(),
                message: "Must not exceed high_message_count".to_string(),
            });
        }

        Ok(())
    }
}

/// Qualification thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationThresholds {
    /// Total at or above which a lead is qualified
    pub minimum_score: u32,
    /// Total at or above which background analysis marks a lead medium quality
    pub medium_score: u32,
    /// Below this confidence the recommendation is to keep talking
    pub min_confidence_for_nurture: u32,
}

impl Default for QualificationThresholds {
    fn default() -> Self {
        Self {
            minimum_score: 60,
            medium_score: 40,
            min_confidence_for_nurture: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetPoints {
    pub undetected: i32,
    pub under_5k: i32,
    pub from_5k_to_10k: i32,
    pub from_10k_to_25k: i32,
    pub from_25k_to_50k: i32,
    pub over_50k: i32,
}

impl Default for BudgetPoints {
    fn default() -> Self {
        Self {
            undetected: 5,
            under_5k: -5,
            from_5k_to_10k: 10,
            from_10k_to_25k: 20,
            from_25k_to_50k: 35,
            over_50k: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelinePoints {
    pub undetected: i32,
    pub urgent: i32,
    pub one_to_three_months: i32,
    pub three_to_six_months: i32,
    pub six_plus_months: i32,
    pub no_timeline: i32,
}

impl Default for TimelinePoints {
    fn default() -> Self {
        Self {
            undetected: 5,
            urgent: 20,
            one_to_three_months: 25,
            three_to_six_months: 15,
            six_plus_months: 8,
            no_timeline: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityPoints {
    pub undetected: i32,
    pub decision_maker: i32,
    pub influencer: i32,
    pub researcher: i32,
}

impl Default for AuthorityPoints {
    fn default() -> Self {
        Self {
            undetected: 15,
            decision_maker: 30,
            influencer: 20,
            researcher: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopePoints {
    pub undetected: i32,
    pub very_clear: i32,
    pub somewhat_clear: i32,
    pub exploring_options: i32,
}

impl Default for ScopePoints {
    fn default() -> Self {
        Self {
            undetected: 10,
            very_clear: 20,
            somewhat_clear: 12,
            exploring_options: 5,
        }
    }
}

/// Engagement points by message count
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementPoints {
    pub high_message_count: usize,
    pub high: i32,
    pub medium_message_count: usize,
    pub medium: i32,
    pub low: i32,
}

impl Default for EngagementPoints {
    fn default() -> Self {
        Self {
            high_message_count: 10,
            high: 10,
            medium_message_count: 5,
            medium: 7,
            low: 3,
        }
    }
}

impl EngagementPoints {
    pub fn points(&self, message_count: usize) -> i32 {
        if message_count >= self.high_message_count {
            self.high
        } else if message_count >= self.medium_message_count {
            self.medium
        } else {
            self.low
        }
    }
}
