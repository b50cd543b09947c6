//! Lead Scoring
//!
//! Scores extracted insights on a 0-100 scale:
//! - Budget, timeline, authority and scope points from `ScoringConfig`
//! - Engagement points from the conversation length
//! - Confidence from how many insight fields were detected
//!
//! Scoring is pure; the same insights and message count always give the
//! same score.

use lead_agent_config::ScoringConfig;
use lead_agent_core::{
    BudgetRange, DecisionAuthority, Insights, LeadRecommendation, LeadScore, ProjectScope,
    ScoreBreakdown, Timeline,
};

/// Lead scorer driven by configured weights
#[derive(Debug, Clone, Default)]
pub struct LeadScorer {
    config: ScoringConfig,
}

impl LeadScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score insights gathered over `message_count` messages
    pub fn score(&self, insights: &Insights, message_count: usize) -> LeadScore {
        let breakdown = ScoreBreakdown {
            budget: self.budget_points(insights.budget),
            timeline: self.timeline_points(insights.timeline),
            authority: self.authority_points(insights.decision_authority),
            scope: self.scope_points(insights.project_scope),
            engagement: self.config.engagement.points(message_count),
        };

        let total = breakdown.sum().clamp(0, 100) as u32;
        let confidence = ((insights.detected_count() as f64 / Insights::FIELD_COUNT as f64)
            * 100.0)
            .round() as u32;
        let thresholds = &self.config.thresholds;
        let qualified = total >= thresholds.minimum_score;

        let recommendation = if qualified {
            LeadRecommendation::ScheduleConsultation
        } else if confidence < thresholds.min_confidence_for_nurture {
            LeadRecommendation::ContinueConversation
        } else {
            LeadRecommendation::Nurture
        };

        tracing::debug!(
            total,
            confidence,
            qualified,
            budget = breakdown.budget,
            timeline = breakdown.timeline,
            authority = breakdown.authority,
            scope = breakdown.scope,
            engagement = breakdown.engagement,
            "Lead scored"
        );

        LeadScore {
            total,
            breakdown,
            qualified,
            confidence,
            recommendation,
        }
    }

    fn budget_points(&self, budget: Option<BudgetRange>) -> i32 {
        let points = &self.config.budget;
        match budget {
            None => points.undetected,
            Some(BudgetRange::Under5k) => points.under_5k,
            Some(BudgetRange::From5kTo10k) => points.from_5k_to_10k,
            Some(BudgetRange::From10kTo25k) => points.from_10k_to_25k,
            Some(BudgetRange::From25kTo50k) => points.from_25k_to_50k,
            Some(BudgetRange::Over50k) => points.over_50k,
        }
    }

    fn timeline_points(&self, timeline: Option<Timeline>) -> i32 {
        let points = &self.config.timeline;
        match timeline {
            None => points.undetected,
            Some(Timeline::Urgent) => points.urgent,
            Some(Timeline::OneToThreeMonths) => points.one_to_three_months,
            Some(Timeline::ThreeToSixMonths) => points.three_to_six_months,
            Some(Timeline::SixPlusMonths) => points.six_plus_months,
            Some(Timeline::NoTimeline) => points.no_timeline,
        }
    }

    fn authority_points(&self, authority: Option<DecisionAuthority>) -> i32 {
        let points = &self.config.authority;
        match authority {
            None => points.undetected,
            Some(DecisionAuthority::DecisionMaker) => points.decision_maker,
            Some(DecisionAuthority::Influencer) => points.influencer,
            Some(DecisionAuthority::Researcher) => points.researcher,
        }
    }

    fn scope_points(&self, scope: Option<ProjectScope>) -> i32 {
        let points = &self.config.scope;
        match scope {
            None => points.undetected,
            Some(ProjectScope::VeryClear) => points.very_clear,
            Some(ProjectScope::SomewhatClear) => points.somewhat_clear,
            Some(ProjectScope::ExploringOptions) => points.exploring_options,
        }
    }
}
