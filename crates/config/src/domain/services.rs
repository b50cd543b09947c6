//! Service catalog
//!
//! The agency's service lines: detection keywords for the extractor,
//! descriptions for the system prompt and ranges for project estimates.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Service catalog loaded from services.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCatalog {
    /// Services in detection priority order
    #[serde(default = "default_services")]
    pub services: Vec<ServiceDefinition>,

    #[serde(default)]
    pub size_multipliers: SizeMultipliers,
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self {
            services: default_services(),
            size_multipliers: SizeMultipliers::default(),
        }
    }
}

/// One service line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Stable id used in insights and lead records
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub price_range: PriceRange,
    pub timeline_weeks: WeekRange,
}

/// Price range in USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub min: u32,
    pub max: u32,
}

/// Estimate multipliers by company size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeMultipliers {
    pub startup: f64,
    pub small_business: f64,
    pub medium_business: f64,
    pub enterprise: f64,
    pub unknown: f64,
}

impl Default for SizeMultipliers {
    fn default() -> Self {
        Self {
            startup: 0.8,
            small_business: 1.0,
            medium_business: 1.3,
            enterprise: 1.8,
            unknown: 1.0,
        }
    }
}

fn service(
    id: &str,
    name: &str,
    description: &str,
    keywords: &[&str],
    price: (u64, u64),
    weeks: (u32, u32),
) -> ServiceDefinition {
    ServiceDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        price_range: PriceRange {
            min: price.0,
            max: price.1,
        },
        timeline_weeks: WeekRange {
            min: weeks.0,
            max: weeks.1,
        },
    }
}

fn default_services() -> Vec<ServiceDefinition> {
    vec![
        service(
            "web-development",
            "Web Development",
            "Marketing sites, web applications and e-commerce stores",
            &[
                "website",
                "web app",
                "web application",
                "landing page",
                "e-commerce",
                "ecommerce",
                "online store",
                "shopify",
                "wordpress",
                "web design",
                "redesign",
            ],
            (5_000, 50_000),
            (4, 12),
        ),
        service(
            "ai-solutions",
            "AI Solutions",
            "Chatbots, workflow automation and custom machine learning",
            &[
                "ai",
                "artificial intelligence",
                "chatbot",
                "machine learning",
                "automation",
                "automate",
                "llm",
                "gpt",
            ],
            (10_000, 100_000),
            (6, 16),
        ),
        service(
            "business-planning",
            "Business Planning",
            "Business plans, market research, pitch decks and financial models",
            &[
                "business plan",
                "strategy",
                "market research",
                "pitch deck",
                "financial model",
                "go-to-market",
                "investors",
            ],
            (3_000, 25_000),
            (2, 6),
        ),
        service(
            "tokenomics",
            "Tokenomics & Blockchain",
            "Token design, smart contracts and web3 launches",
            &[
                "tokenomics",
                "token",
                "blockchain",
                "crypto",
                "web3",
                "smart contract",
                "nft",
                "defi",
            ],
            (15_000, 150_000),
            (6, 20),
        ),
    ]
}

impl ServiceCatalog {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;

        let catalog: Self = serde_yaml::from_str(&content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, service) in self.services.iter().enumerate() {
            if service.id.is_empty() {
                return Err(ConfigError::MissingField(format!("services[{}].id", i)));
            }
            if service.price_range.min > service.price_range.max {
                return Err(ConfigError::InvalidValue {
                    field: format!("services[{}].price_range", i),
                    message: "min must not exceed max".to_string(),
                });
            }
            if service.timeline_weeks.min > service.timeline_weeks.max {
                return Err(ConfigError::InvalidValue {
                    field: format!("services[{}].timeline_weeks", i),
                    message: "min must not exceed max".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Look up a service by id
    pub fn get(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Look up a service by id or display name, case-insensitively
    pub fn resolve(&self, id_or_name: &str) -> Option<&ServiceDefinition> {
        let needle = id_or_name.trim();
        self.services
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(needle) || s.name.eq_ignore_ascii_case(needle))
    }
}
