//! Project estimates from the service catalog

use lead_agent_config::ServiceCatalog;
use lead_agent_core::{CompanySize, Insights, ProjectEstimate};

const CURRENCY: &str = "USD";

/// Rough price and duration ranges, scaled by company size
#[derive(Debug, Clone, Default)]
pub struct ProjectEstimator {
    catalog: ServiceCatalog,
}

impl ProjectEstimator {
    pub fn new(catalog: ServiceCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    /// Estimate for a service id or display name; `None` if unknown
    pub fn estimate(&self, service: &str, insights: &Insights) -> Option<ProjectEstimate> {
        let definition = self.catalog.resolve(service)?;
        let multipliers = &self.catalog.size_multipliers;
        let multiplier = match insights.company_size {
            Some(CompanySize::Startup) => multipliers.startup,
            Some(CompanySize::SmallBusiness) => multipliers.small_business,
            Some(CompanySize::MediumBusiness) => multipliers.medium_business,
            Some(CompanySize::Enterprise) => multipliers.enterprise,
            None => multipliers.unknown,
        };

        Some(ProjectEstimate {
            service_type: definition.id.clone(),
            min_price: scale_price(definition.price_range.min, multiplier),
            max_price: scale_price(definition.price_range.max, multiplier),
            min_weeks: definition.timeline_weeks.min,
            max_weeks: definition.timeline_weeks.max,
            currency: CURRENCY.to_string(),
        })
    }
}

/// Scale and round to the nearest hundred
fn scale_price(price: u64, multiplier: f64) -> u64 {
    ((price as f64 * multiplier) / 100.0).round() as u64 * 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_service() {
        let estimator = ProjectEstimator::default();
        assert!(estimator.estimate("underwater-basket-weaving", &Insights::default()).is_none());
    }

    #[test]
    fn test_unscaled_when_size_unknown() {
        let estimate = ProjectEstimator::default()
            .estimate("web-development", &Insights::default())
            .unwrap();
        assert_eq!(estimate.min_price, 5_000);
        assert_eq!(estimate.max_price, 50_000);
        assert_eq!(estimate.min_weeks, 4);
        assert_eq!(estimate.max_weeks, 12);
        assert_eq!(estimate.currency, "USD");
    }

    #[test]
    fn test_company_size_multiplier() {
        let estimator = ProjectEstimator::default();
        let enterprise = Insights {
            company_size: Some(CompanySize::Enterprise),
            ..Default::default()
        };
        let estimate = estimator.estimate("AI Solutions", &enterprise).unwrap();
        assert_eq!(estimate.service_type, "ai-solutions");
        assert_eq!(estimate.min_price, 18_000);
        assert_eq!(estimate.max_price, 180_000);

        let startup = Insights {
            company_size: Some(CompanySize::Startup),
            ..Default::default()
        };
        let estimate = estimator.estimate("web-development", &startup).unwrap();
        assert_eq!(estimate.min_price, 4_000);
        assert_eq!(estimate.max_price, 40_000);
    }
}
