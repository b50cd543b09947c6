//! Qualification insights inferred from a conversation
//!
//! Every field is optional; `None` means the signal was not detected.
//! Labels serialize to the strings the chat front end displays.

use serde::{Deserialize, Serialize};

/// Budget bracket in USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetRange {
    #[serde(rename = "<$5k")]
    Under5k,
    #[serde(rename = "$5k-$10k")]
    From5kTo10k,
    #[serde(rename = "$10k-$25k")]
    From10kTo25k,
    #[serde(rename = "$25k-$50k")]
    From25kTo50k,
    #[serde(rename = "$50k+")]
    Over50k,
}

impl BudgetRange {
    /// Brackets from lowest to highest
    pub const ALL: [BudgetRange; 5] = [
        BudgetRange::Under5k,
        BudgetRange::From5kTo10k,
        BudgetRange::From10kTo25k,
        BudgetRange::From25kTo50k,
        BudgetRange::Over50k,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetRange::Under5k => "<$5k",
            BudgetRange::From5kTo10k => "$5k-$10k",
            BudgetRange::From10kTo25k => "$10k-$25k",
            BudgetRange::From25kTo50k => "$25k-$50k",
            BudgetRange::Over50k => "$50k+",
        }
    }

    /// Bucket an amount given ascending upper bounds for the first four brackets
    pub fn from_amount(amount: f64, upper_bounds: &[f64; 4]) -> Self {
        upper_bounds
            .iter()
            .zip(Self::ALL.iter())
            .find(|(bound, _)| amount < **bound)
            .map(|(_, range)| *range)
            .unwrap_or(BudgetRange::Over50k)
    }
}

/// Project timeline bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeline {
    #[serde(rename = "urgent")]
    Urgent,
    #[serde(rename = "1-3 months")]
    OneToThreeMonths,
    #[serde(rename = "3-6 months")]
    ThreeToSixMonths,
    #[serde(rename = "6+ months")]
    SixPlusMonths,
    #[serde(rename = "no timeline")]
    NoTimeline,
}

impl Timeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeline::Urgent => "urgent",
            Timeline::OneToThreeMonths => "1-3 months",
            Timeline::ThreeToSixMonths => "3-6 months",
            Timeline::SixPlusMonths => "6+ months",
            Timeline::NoTimeline => "no timeline",
        }
    }

    /// Bucket a duration in months given the urgent/short/medium upper bounds
    pub fn from_months(months: f64, bounds: &[f64; 3]) -> Self {
        if months < bounds[0] {
            Timeline::Urgent
        } else if months <= bounds[1] {
            Timeline::OneToThreeMonths
        } else if months <= bounds[2] {
            Timeline::ThreeToSixMonths
        } else {
            Timeline::SixPlusMonths
        }
    }
}

/// How much say the visitor has over the purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionAuthority {
    #[serde(rename = "decision maker")]
    DecisionMaker,
    #[serde(rename = "influencer")]
    Influencer,
    #[serde(rename = "researcher")]
    Researcher,
}

impl DecisionAuthority {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionAuthority::DecisionMaker => "decision maker",
            DecisionAuthority::Influencer => "influencer",
            DecisionAuthority::Researcher => "researcher",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Moderate,
    Low,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::High => "high",
            Urgency::Moderate => "moderate",
            Urgency::Low => "low",
        }
    }
}

/// How well-defined the project is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectScope {
    #[serde(rename = "very clear")]
    VeryClear,
    #[serde(rename = "somewhat clear")]
    SomewhatClear,
    #[serde(rename = "exploring options")]
    ExploringOptions,
}

impl ProjectScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectScope::VeryClear => "very clear",
            ProjectScope::SomewhatClear => "somewhat clear",
            ProjectScope::ExploringOptions => "exploring options",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "startup")]
    Startup,
    #[serde(rename = "small business")]
    SmallBusiness,
    #[serde(rename = "medium business")]
    MediumBusiness,
    #[serde(rename = "enterprise")]
    Enterprise,
}

impl CompanySize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Startup => "startup",
            CompanySize::SmallBusiness => "small business",
            CompanySize::MediumBusiness => "medium business",
            CompanySize::Enterprise => "enterprise",
        }
    }

    /// Bucket a headcount given startup/small/medium upper bounds
    pub fn from_employees(employees: u64, bounds: &[u64; 3]) -> Self {
        if employees < bounds[0] {
            CompanySize::Startup
        } else if employees < bounds[1] {
            CompanySize::SmallBusiness
        } else if employees < bounds[2] {
            CompanySize::MediumBusiness
        } else {
            CompanySize::Enterprise
        }
    }
}

/// Signals extracted from a conversation. Recomputed on demand, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Insights {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    /// Service catalog id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_authority: Option<DecisionAuthority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_scope: Option<ProjectScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<CompanySize>,
}

impl Insights {
    /// Number of fields carrying a value
    pub const FIELD_COUNT: usize = 7;

    /// Count of detected fields, used for confidence
    pub fn detected_count(&self) -> usize {
        [
            self.budget.is_some(),
            self.timeline.is_some(),
            self.service_type.is_some(),
            self.decision_authority.is_some(),
            self.urgency.is_some(),
            self.project_scope.is_some(),
            self.company_size.is_some(),
        ]
        .iter()
        .filter(|detected| **detected)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET_BOUNDS: [f64; 4] = [5_000.0, 10_000.0, 25_000.0, 50_000.0];

    #[test]
    fn test_budget_buckets() {
        assert_eq!(BudgetRange::from_amount(0.0, &BUDGET_BOUNDS), BudgetRange::Under5k);
        assert_eq!(BudgetRange::from_amount(4_999.0, &BUDGET_BOUNDS), BudgetRange::Under5k);
        assert_eq!(BudgetRange::from_amount(5_000.0, &BUDGET_BOUNDS), BudgetRange::From5kTo10k);
        assert_eq!(BudgetRange::from_amount(30_000.0, &BUDGET_BOUNDS), BudgetRange::From25kTo50k);
        assert_eq!(BudgetRange::from_amount(50_000.0, &BUDGET_BOUNDS), BudgetRange::Over50k);
    }

    #[test]
    fn test_timeline_buckets() {
        let bounds = [1.0, 3.0, 6.0];
        assert_eq!(Timeline::from_months(0.5, &bounds), Timeline::Urgent);
        assert_eq!(Timeline::from_months(2.0, &bounds), Timeline::OneToThreeMonths);
        assert_eq!(Timeline::from_months(3.0, &bounds), Timeline::OneToThreeMonths);
        assert_eq!(Timeline::from_months(6.0, &bounds), Timeline::ThreeToSixMonths);
        assert_eq!(Timeline::from_months(12.0, &bounds), Timeline::SixPlusMonths);
    }

    #[test]
    fn test_company_size_buckets() {
        let bounds = [10, 50, 500];
        assert_eq!(CompanySize::from_employees(3, &bounds), CompanySize::Startup);
        assert_eq!(CompanySize::from_employees(25, &bounds), CompanySize::SmallBusiness);
        assert_eq!(CompanySize::from_employees(200, &bounds), CompanySize::MediumBusiness);
        assert_eq!(CompanySize::from_employees(5000, &bounds), CompanySize::Enterprise);
    }

    #[test]
    fn test_labels_serialize_as_display_strings() {
        let insights = Insights {
            budget: Some(BudgetRange::From25kTo50k),
            timeline: Some(Timeline::OneToThreeMonths),
            decision_authority: Some(DecisionAuthority::DecisionMaker),
            ..Default::default()
        };
        let json = serde_json::to_value(&insights).unwrap();
        assert_eq!(json["budget"], "$25k-$50k");
        assert_eq!(json["timeline"], "1-3 months");
        assert_eq!(json["decisionAuthority"], "decision maker");
        assert!(json.get("urgency").is_none());
        assert_eq!(BudgetRange::From25kTo50k.as_str(), "$25k-$50k");
    }

    #[test]
    fn test_detected_count() {
        assert_eq!(Insights::default().detected_count(), 0);
        let insights = Insights {
            urgency: Some(Urgency::Moderate),
            service_type: Some("web-development".to_string()),
            ..Default::default()
        };
        assert_eq!(insights.detected_count(), 2);
    }
}
