//! Lead qualification domain configuration
//!
//! `LeadConfig` bundles the three YAML-driven tables that the extractor,
//! scorer and estimator are constructed from.

mod extraction;
mod scoring;
mod services;

pub use extraction::{
    AuthorityKeywords, BudgetKeywords, CompanySizeKeywords, ExtractionConfig, ScopeKeywords,
    TimelineKeywords, UrgencyKeywords,
};
pub use scoring::{
    AuthorityPoints, BudgetPoints, EngagementPoints, QualificationThresholds, ScopePoints,
    ScoringConfig, TimelinePoints,
};
pub use services::{PriceRange, ServiceCatalog, ServiceDefinition, SizeMultipliers, WeekRange};

use std::path::Path;

use crate::ConfigError;

/// All lead qualification tables
#[derive(Debug, Clone, Default)]
pub struct LeadConfig {
    pub scoring: ScoringConfig,
    pub extraction: ExtractionConfig,
    pub services: ServiceCatalog,
}

impl LeadConfig {
    /// Load scoring.yaml, extraction.yaml and services.yaml from `dir`
    ///
    /// A missing file falls back to defaults; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        Ok(Self {
            scoring: load_or_default(&dir.join("scoring.yaml"), |p| ScoringConfig::load(p))?,
            extraction: load_or_default(&dir.join("extraction.yaml"), |p| {
                ExtractionConfig::load(p)
            })?,
            services: load_or_default(&dir.join("services.yaml"), |p| ServiceCatalog::load(p))?,
        })
    }
}

fn load_or_default<T: Default>(
    path: &Path,
    load: impl FnOnce(&Path) -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "Config file not found, using defaults");
        return Ok(T::default());
    }
    let value = load(path)?;
    tracing::info!(path = %path.display(), "Loaded lead configuration");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_dir_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LeadConfig::load(dir.path()).unwrap();
        assert_eq!(config.scoring.thresholds.minimum_score, 60);
        assert_eq!(config.services.services.len(), 4);
    }

    #[test]
    fn test_load_overrides_single_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("scoring.yaml"),
            "thresholds:\n  minimum_score: 75\n",
        )
        .unwrap();

        let config = LeadConfig::load(dir.path()).unwrap();
        assert_eq!(config.scoring.thresholds.minimum_score, 75);
        assert_eq!(config.extraction.timeline.month_bounds, [1.0, 3.0, 6.0]);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("services.yaml"), "services: [[[").unwrap();
        assert!(LeadConfig::load(dir.path()).is_err());
    }
}
