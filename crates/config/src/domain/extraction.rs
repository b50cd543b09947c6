//! Signal extraction configuration
//!
//! Keyword tables and bucket boundaries for the insight extractor.
//! Keywords are matched case-insensitively on word boundaries, and
//! within a category the first tier listed wins.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Extraction configuration loaded from extraction.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub budget: BudgetKeywords,
    #[serde(default)]
    pub timeline: TimelineKeywords,
    #[serde(default)]
    pub authority: AuthorityKeywords,
    #[serde(default)]
    pub urgency: UrgencyKeywords,
    #[serde(default)]
    pub scope: ScopeKeywords,
    #[serde(default)]
    pub company_size: CompanySizeKeywords,
}

impl ExtractionConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_ascending(&self.budget.bracket_upper_bounds) {
            return Err(ConfigError::InvalidValue {
                field: "budget.bracket_upper_bounds".to_string(),
                message: "Bounds must be strictly ascending".to_string(),
            });
        }
        if !is_ascending(&self.timeline.month_bounds) {
            return Err(ConfigError::InvalidValue {
                field: "timeline.month_bounds".to_string(),
                message: "Bounds must be strictly ascending".to_string(),
            });
        }
        let employees = &self.company_size.employee_bounds;
        if !(employees[0] < employees[1] && employees[1] < employees[2]) {
            return Err(ConfigError::InvalidValue {
                field: "company_size.employee_bounds".to_string(),
                message: "Bounds must be strictly ascending".to_string(),
            });
        }
        Ok(())
    }
}

fn is_ascending(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetKeywords {
    /// Upper bounds (USD, exclusive) of the four lowest brackets
    pub bracket_upper_bounds: [f64; 4],
    /// Phrases mapping to the lowest bracket
    pub constrained: Vec<String>,
    /// Phrases mapping to the highest bracket
    pub flexible: Vec<String>,
}

impl Default for BudgetKeywords {
    fn default() -> Self {
        Self {
            bracket_upper_bounds: [5_000.0, 10_000.0, 25_000.0, 50_000.0],
            constrained: strings(&[
                "limited budget",
                "tight budget",
                "small budget",
                "low budget",
                "shoestring",
                "cheap",
            ]),
            flexible: strings(&[
                "flexible budget",
                "budget is flexible",
                "well-funded",
                "well funded",
                "no budget constraints",
                "money is not an issue",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineKeywords {
    /// Keywords that short-circuit to an urgent timeline
    pub urgent: Vec<String>,
    /// Upper bounds in months for urgent (exclusive), 1-3 and 3-6 (inclusive)
    pub month_bounds: [f64; 3],
    pub no_timeline: Vec<String>,
}

impl Default for TimelineKeywords {
    fn default() -> Self {
        Self {
            urgent: strings(&["asap", "urgent", "urgently", "immediately"]),
            month_bounds: [1.0, 3.0, 6.0],
            no_timeline: strings(&["no rush", "no timeline", "no deadline", "no hurry"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityKeywords {
    pub decision_maker: Vec<String>,
    pub influencer: Vec<String>,
    pub researcher: Vec<String>,
}

impl Default for AuthorityKeywords {
    fn default() -> Self {
        Self {
            decision_maker: strings(&[
                "owner",
                "founder",
                "co-founder",
                "ceo",
                "cto",
                "cfo",
                "coo",
                "vp",
                "vice president",
                "director",
                "president",
                "i decide",
                "my decision",
            ]),
            influencer: strings(&[
                "manager",
                "team lead",
                "head of",
                "recommend",
                "my boss",
                "present to",
            ]),
            researcher: strings(&[
                "exploring",
                "researching",
                "just browsing",
                "just looking",
                "gathering information",
                "curious",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyKeywords {
    pub high: Vec<String>,
    pub moderate: Vec<String>,
    pub low: Vec<String>,
}

impl Default for UrgencyKeywords {
    fn default() -> Self {
        Self {
            high: strings(&[
                "urgent",
                "urgently",
                "asap",
                "immediately",
                "right away",
                "emergency",
                "critical",
            ]),
            moderate: strings(&[
                "soon",
                "within a month",
                "next few weeks",
                "quickly",
                "this quarter",
            ]),
            low: strings(&["no rush", "flexible", "whenever", "no hurry", "eventually"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeKeywords {
    pub very_clear: Vec<String>,
    pub somewhat_clear: Vec<String>,
    pub exploring: Vec<String>,
}

impl Default for ScopeKeywords {
    fn default() -> Self {
        Self {
            very_clear: strings(&[
                "detailed",
                "specific",
                "exactly",
                "requirements",
                "specification",
                "wireframe",
                "wireframes",
                "mockup",
                "mockups",
            ]),
            somewhat_clear: strings(&["idea", "concept", "generally", "rough", "outline"]),
            exploring: strings(&[
                "not sure",
                "maybe",
                "thinking about",
                "considering",
                "unsure",
                "options",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySizeKeywords {
    pub startup: Vec<String>,
    pub small_business: Vec<String>,
    pub medium_business: Vec<String>,
    pub enterprise: Vec<String>,
    /// Headcount upper bounds (exclusive) for startup, small and medium
    pub employee_bounds: [u64; 3],
}

impl Default for CompanySizeKeywords {
    fn default() -> Self {
        Self {
            startup: strings(&["startup", "start-up", "early stage", "pre-seed", "seed stage"]),
            small_business: strings(&["small business", "smb", "small company", "family business"]),
            medium_business: strings(&[
                "mid-size",
                "midsize",
                "medium-sized",
                "medium sized",
                "growing company",
            ]),
            enterprise: strings(&[
                "enterprise",
                "large company",
                "corporation",
                "fortune 500",
                "multinational",
            ]),
            employee_bounds: [10, 50, 500],
        }
    }
}
