//! Signal Extraction
//!
//! Rule-based extraction of qualification insights from conversation text.
//! Keyword tables come from `ExtractionConfig` and the service catalog;
//! numeric patterns (amounts, durations, headcounts) are fixed.
//!
//! Each category is first-match-wins. Extraction is deterministic and
//! idempotent: the same history always yields the same insights.

use once_cell::sync::Lazy;
use regex::Regex;

use lead_agent_config::{ExtractionConfig, ServiceCatalog};
use lead_agent_core::{
    BudgetRange, ChatMessage, CompanySize, DecisionAuthority, Error, Insights, ProjectScope,
    Result, Timeline, Urgency,
};

/// Multiplier applied to a captured amount
#[derive(Debug, Clone, Copy)]
enum AmountMultiplier {
    Unit,     // 1
    Thousand, // 1,000
    Million,  // 1,000,000
}

impl AmountMultiplier {
    fn value(&self) -> f64 {
        match self {
            AmountMultiplier::Unit => 1.0,
            AmountMultiplier::Thousand => 1_000.0,
            AmountMultiplier::Million => 1_000_000.0,
        }
    }
}

/// Amount patterns, tried in order
///
/// Dollar-anchored forms first; bare forms like "10k" only apply when no
/// dollar amount is present.
static AMOUNT_PATTERNS: Lazy<Vec<(Regex, AmountMultiplier)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"\$\s?(\d+(?:\.\d+)?)\s?k\b").unwrap(), AmountMultiplier::Thousand),
        (
            Regex::new(r"\$\s?(\d+(?:\.\d+)?)\s?(?:m|mm|million)\b").unwrap(),
            AmountMultiplier::Million,
        ),
        (
            Regex::new(r"\$\s?(\d{1,3}(?:,\d{3})+|\d+)").unwrap(),
            AmountMultiplier::Unit,
        ),
        (
            Regex::new(r"(\d{1,3}(?:,\d{3})+|\d{4,})\s?(?:dollars|usd)\b").unwrap(),
            AmountMultiplier::Unit,
        ),
        (
            Regex::new(r"(\d+(?:\.\d+)?)\s?(?:m|mm|million)\b").unwrap(),
            AmountMultiplier::Million,
        ),
        (
            Regex::new(r"(\d+(?:\.\d+)?)\s?(?:k|thousand)\b").unwrap(),
            AmountMultiplier::Thousand,
        ),
    ]
});

/// Duration patterns with their length in months per captured unit
static DURATION_PATTERNS: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(?:within|in|next)\s+(\d+(?:\.\d+)?)\s+months?\b").unwrap(),
            1.0,
        ),
        (
            Regex::new(r"\b(?:within|in|next)\s+(\d+(?:\.\d+)?)\s+weeks?\b").unwrap(),
            1.0 / 4.33,
        ),
        (
            Regex::new(r"\b(?:within|in|next)\s+(\d+(?:\.\d+)?)\s+years?\b").unwrap(),
            12.0,
        ),
    ]
});

static HEADCOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}(?:,\d{3})+|\d+)\s*\+?\s*(?:employees|people|staff|team members)\b")
        .unwrap()
});

/// Compiled alternation over a keyword list, matched on word boundaries
#[derive(Debug, Clone)]
struct KeywordSet {
    pattern: Option<Regex>,
}

impl KeywordSet {
    fn new(keywords: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .map(|k| {
                let starts_word = k.chars().next().is_some_and(char::is_alphanumeric);
                let ends_word = k.chars().last().is_some_and(char::is_alphanumeric);
                format!(
                    "{}{}{}",
                    if starts_word { r"\b" } else { "" },
                    regex::escape(&k),
                    if ends_word { r"\b" } else { "" },
                )
            })
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = Regex::new(&format!("(?:{})", alternatives.join("|")))
            .map_err(|e| Error::Config(format!("Invalid keyword table: {}", e)))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    fn matches(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }
}

/// First tier whose keywords appear in the text
fn first_tier<T: Copy>(text: &str, tiers: &[(KeywordSet, T)]) -> Option<T> {
    tiers
        .iter()
        .find(|(keywords, _)| keywords.matches(text))
        .map(|(_, value)| *value)
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

/// Extracts qualification insights from conversation text
#[derive(Debug, Clone)]
pub struct InsightExtractor {
    budget_bounds: [f64; 4],
    budget_constrained: KeywordSet,
    budget_flexible: KeywordSet,
    timeline_urgent: KeywordSet,
    month_bounds: [f64; 3],
    no_timeline: KeywordSet,
    services: Vec<(String, KeywordSet)>,
    authority: Vec<(KeywordSet, DecisionAuthority)>,
    urgency: Vec<(KeywordSet, Urgency)>,
    scope: Vec<(KeywordSet, ProjectScope)>,
    company_size: Vec<(KeywordSet, CompanySize)>,
    employee_bounds: [u64; 3],
}

impl InsightExtractor {
    /// Compile keyword tables. Fails only if a table cannot be compiled.
    pub fn new(config: &ExtractionConfig, catalog: &ServiceCatalog) -> Result<Self> {
        let services = catalog
            .services
            .iter()
            .map(|s| Ok((s.id.clone(), KeywordSet::new(&s.keywords)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            budget_bounds: config.budget.bracket_upper_bounds,
            budget_constrained: KeywordSet::new(&config.budget.constrained)?,
            budget_flexible: KeywordSet::new(&config.budget.flexible)?,
            timeline_urgent: KeywordSet::new(&config.timeline.urgent)?,
            month_bounds: config.timeline.month_bounds,
            no_timeline: KeywordSet::new(&config.timeline.no_timeline)?,
            services,
            authority: vec![
                (
                    KeywordSet::new(&config.authority.decision_maker)?,
                    DecisionAuthority::DecisionMaker,
                ),
                (
                    KeywordSet::new(&config.authority.influencer)?,
                    DecisionAuthority::Influencer,
                ),
                (
                    KeywordSet::new(&config.authority.researcher)?,
                    DecisionAuthority::Researcher,
                ),
            ],
            urgency: vec![
                (KeywordSet::new(&config.urgency.high)?, Urgency::High),
                (KeywordSet::new(&config.urgency.moderate)?, Urgency::Moderate),
                (KeywordSet::new(&config.urgency.low)?, Urgency::Low),
            ],
            scope: vec![
                (KeywordSet::new(&config.scope.very_clear)?, ProjectScope::VeryClear),
                (
                    KeywordSet::new(&config.scope.somewhat_clear)?,
                    ProjectScope::SomewhatClear,
                ),
                (
                    KeywordSet::new(&config.scope.exploring)?,
                    ProjectScope::ExploringOptions,
                ),
            ],
            company_size: vec![
                (KeywordSet::new(&config.company_size.startup)?, CompanySize::Startup),
                (
                    KeywordSet::new(&config.company_size.small_business)?,
                    CompanySize::SmallBusiness,
                ),
                (
                    KeywordSet::new(&config.company_size.medium_business)?,
                    CompanySize::MediumBusiness,
                ),
                (
                    KeywordSet::new(&config.company_size.enterprise)?,
                    CompanySize::Enterprise,
                ),
            ],
            employee_bounds: config.company_size.employee_bounds,
        })
    }

    /// Extract insights from the full message history
    pub fn extract(&self, messages: &[ChatMessage]) -> Insights {
        let text = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        self.extract_text(&text)
    }

    /// Extract insights from free text
    pub fn extract_text(&self, text: &str) -> Insights {
        let text = text.to_lowercase();

        Insights {
            budget: self.extract_budget(&text),
            timeline: self.extract_timeline(&text),
            service_type: self.extract_service(&text),
            decision_authority: first_tier(&text, &self.authority),
            urgency: Some(first_tier(&text, &self.urgency).unwrap_or(Urgency::Moderate)),
            project_scope: first_tier(&text, &self.scope),
            company_size: self.extract_company_size(&text),
        }
    }

    /// Dollar amount mentioned in the text, if any
    pub fn extract_amount(&self, text: &str) -> Option<f64> {
        AMOUNT_PATTERNS.iter().find_map(|(pattern, multiplier)| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_number(m.as_str()))
                .map(|amount| amount * multiplier.value())
        })
    }

    fn extract_budget(&self, text: &str) -> Option<BudgetRange> {
        if let Some(amount) = self.extract_amount(text) {
            return Some(BudgetRange::from_amount(amount, &self.budget_bounds));
        }
        if self.budget_constrained.matches(text) {
            Some(BudgetRange::Under5k)
        } else if self.budget_flexible.matches(text) {
            Some(BudgetRange::Over50k)
        } else {
            None
        }
    }

    fn extract_timeline(&self, text: &str) -> Option<Timeline> {
        if self.timeline_urgent.matches(text) {
            return Some(Timeline::Urgent);
        }

        let months = DURATION_PATTERNS.iter().find_map(|(pattern, months_per_unit)| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_number(m.as_str()))
                .map(|n| n * months_per_unit)
        });
        if let Some(months) = months {
            return Some(Timeline::from_months(months, &self.month_bounds));
        }

        self.no_timeline.matches(text).then_some(Timeline::NoTimeline)
    }

    fn extract_service(&self, text: &str) -> Option<String> {
        self.services
            .iter()
            .find(|(_, keywords)| keywords.matches(text))
            .map(|(id, _)| id.clone())
    }

    fn extract_company_size(&self, text: &str) -> Option<CompanySize> {
        if let Some(size) = first_tier(text, &self.company_size) {
            return Some(size);
        }
        HEADCOUNT_PATTERN
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_number(m.as_str()))
            .map(|n| CompanySize::from_employees(n as u64, &self.employee_bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> InsightExtractor {
        InsightExtractor::new(&ExtractionConfig::default(), &ServiceCatalog::default()).unwrap()
    }

    #[test]
    fn test_empty_text_only_urgency() {
        let insights = extractor().extract(&[]);
        assert_eq!(insights.urgency, Some(Urgency::Moderate));
        assert_eq!(insights.detected_count(), 1);
        assert!(insights.budget.is_none());
        assert!(insights.service_type.is_none());
    }

    #[test]
    fn test_ceo_scenario() {
        let insights = extractor().extract_text(
            "My budget is around $30k and I need this done in 2 months, I'm the CEO",
        );
        assert_eq!(insights.budget, Some(BudgetRange::From25kTo50k));
        assert_eq!(insights.timeline, Some(Timeline::OneToThreeMonths));
        assert_eq!(insights.decision_authority, Some(DecisionAuthority::DecisionMaker));
    }

    #[test]
    fn test_amount_extraction() {
        let e = extractor();
        assert_eq!(e.extract_amount("$30k"), Some(30_000.0));
        assert_eq!(e.extract_amount("around $30,000 total"), Some(30_000.0));
        assert_eq!(e.extract_amount("maybe 30 thousand"), Some(30_000.0));
        assert_eq!(e.extract_amount("about 12k"), Some(12_000.0));
        assert_eq!(e.extract_amount("$1.5m raise"), Some(1_500_000.0));
        assert_eq!(e.extract_amount("2 million"), Some(2_000_000.0));
        assert_eq!(e.extract_amount("15000 usd"), Some(15_000.0));
        assert_eq!(e.extract_amount("in 2 months"), None);
    }

    #[test]
    fn test_dollar_amount_beats_bare_counts() {
        let e = extractor();
        assert_eq!(
            e.extract_text("We get 10k monthly visitors and our budget is $3,000").budget,
            Some(BudgetRange::Under5k)
        );
        assert_eq!(
            e.extract_text("Our app has 2 million users, budget is $4,000").budget,
            Some(BudgetRange::Under5k)
        );
        assert_eq!(
            e.extract_amount("500k downloads, we can spend 8000 dollars"),
            Some(8_000.0)
        );
    }

    #[test]
    fn test_budget_buckets() {
        let e = extractor();
        assert_eq!(e.extract_text("$3k").budget, Some(BudgetRange::Under5k));
        assert_eq!(e.extract_text("$7,500").budget, Some(BudgetRange::From5kTo10k));
        assert_eq!(e.extract_text("20k").budget, Some(BudgetRange::From10kTo25k));
        assert_eq!(e.extract_text("$2 million").budget, Some(BudgetRange::Over50k));
    }

    #[test]
    fn test_budget_keyword_fallback() {
        let e = extractor();
        assert_eq!(
            e.extract_text("We have a tight budget").budget,
            Some(BudgetRange::Under5k)
        );
        assert_eq!(
            e.extract_text("We're well-funded").budget,
            Some(BudgetRange::Over50k)
        );
        assert_eq!(e.extract_text("Hello there").budget, None);
    }

    #[test]
    fn test_timeline() {
        let e = extractor();
        assert_eq!(e.extract_text("We need it ASAP").timeline, Some(Timeline::Urgent));
        assert_eq!(e.extract_text("within 2 weeks").timeline, Some(Timeline::Urgent));
        assert_eq!(
            e.extract_text("launch in 3 months").timeline,
            Some(Timeline::OneToThreeMonths)
        );
        assert_eq!(
            e.extract_text("within 5 months").timeline,
            Some(Timeline::ThreeToSixMonths)
        );
        assert_eq!(
            e.extract_text("in 9 months or so").timeline,
            Some(Timeline::SixPlusMonths)
        );
        assert_eq!(e.extract_text("no rush at all").timeline, Some(Timeline::NoTimeline));
        assert_eq!(e.extract_text("hi").timeline, None);
    }

    #[test]
    fn test_service_detection() {
        let e = extractor();
        assert_eq!(
            e.extract_text("I need a new website").service_type.as_deref(),
            Some("web-development")
        );
        assert_eq!(
            e.extract_text("Can you build an AI chatbot?").service_type.as_deref(),
            Some("ai-solutions")
        );
        assert_eq!(
            e.extract_text("We need a pitch deck for investors").service_type.as_deref(),
            Some("business-planning")
        );
        assert_eq!(
            e.extract_text("designing tokenomics for our launch").service_type.as_deref(),
            Some("tokenomics")
        );
    }

    #[test]
    fn test_short_keywords_need_word_boundaries() {
        let e = extractor();
        // "ai" inside "said"/"maintain", "vp" nowhere as a word
        let insights = e.extract_text("She said we should maintain the vpn");
        assert_eq!(insights.service_type, None);
        assert_eq!(insights.decision_authority, None);
    }

    #[test]
    fn test_authority_tiers() {
        let e = extractor();
        assert_eq!(
            e.extract_text("I'm the founder").decision_authority,
            Some(DecisionAuthority::DecisionMaker)
        );
        assert_eq!(
            e.extract_text("I'll present to my boss").decision_authority,
            Some(DecisionAuthority::Influencer)
        );
        assert_eq!(
            e.extract_text("just researching for now").decision_authority,
            Some(DecisionAuthority::Researcher)
        );
    }

    #[test]
    fn test_urgency_and_scope() {
        let e = extractor();
        assert_eq!(e.extract_text("this is urgent").urgency, Some(Urgency::High));
        assert_eq!(e.extract_text("whenever works").urgency, Some(Urgency::Low));
        assert_eq!(
            e.extract_text("we have detailed requirements").project_scope,
            Some(ProjectScope::VeryClear)
        );
        assert_eq!(
            e.extract_text("just a rough idea").project_scope,
            Some(ProjectScope::SomewhatClear)
        );
        assert_eq!(
            e.extract_text("not sure what we need").project_scope,
            Some(ProjectScope::ExploringOptions)
        );
    }

    #[test]
    fn test_company_size() {
        let e = extractor();
        assert_eq!(
            e.extract_text("we're an early stage startup").company_size,
            Some(CompanySize::Startup)
        );
        assert_eq!(
            e.extract_text("We are a Fortune 500 company").company_size,
            Some(CompanySize::Enterprise)
        );
        assert_eq!(
            e.extract_text("about 25 employees").company_size,
            Some(CompanySize::SmallBusiness)
        );
        assert_eq!(
            e.extract_text("1,200 staff worldwide").company_size,
            Some(CompanySize::Enterprise)
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let e = extractor();
        let text = "We're a startup, budget $12k, need a web app within 4 months";
        assert_eq!(e.extract_text(text), e.extract_text(text));
    }

    #[test]
    fn test_custom_keyword_table() {
        let mut config = ExtractionConfig::default();
        config.authority.decision_maker = vec!["managing partner".to_string()];
        let e = InsightExtractor::new(&config, &ServiceCatalog::default()).unwrap();
        assert_eq!(
            e.extract_text("I'm the managing partner").decision_authority,
            Some(DecisionAuthority::DecisionMaker)
        );
        assert_eq!(e.extract_text("I'm the CEO").decision_authority, None);
    }
}
