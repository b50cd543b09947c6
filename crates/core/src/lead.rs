//! Lead score and qualified lead records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::insights::Insights;

/// Points awarded per scoring component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub budget: i32,
    pub timeline: i32,
    pub authority: i32,
    pub scope: i32,
    pub engagement: i32,
}

impl ScoreBreakdown {
    /// Plain sum of all components, before clamping
    pub fn sum(&self) -> i32 {
        self.budget + self.timeline + self.authority + self.scope + self.engagement
    }
}

/// Recommended next step for the lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadRecommendation {
    /// Qualified: offer a consultation call
    ScheduleConsultation,
    /// Enough is known and the lead is not qualified yet
    Nurture,
    /// Too little is known to judge
    ContinueConversation,
}

/// Lead score with breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScore {
    /// `breakdown.sum()` clamped to 0..=100, so the two differ when the
    /// components add up past either end
    pub total: u32,
    pub breakdown: ScoreBreakdown,
    /// `total >= minimum_score`
    pub qualified: bool,
    /// Percentage of insight fields detected (0-100)
    pub confidence: u32,
    pub recommendation: LeadRecommendation,
}

/// Rough price and duration range for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEstimate {
    pub service_type: String,
    pub min_price: u64,
    pub max_price: u64,
    pub min_weeks: u32,
    pub max_weeks: u32,
    pub currency: String,
}

/// Contact details from the lead form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadContact {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// A finalized lead. Created once per submission and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedLead {
    pub id: String,
    pub session_id: String,
    pub contact: LeadContact,
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub score: LeadScore,
    pub insights: Insights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<ProjectEstimate>,
    pub created_at: DateTime<Utc>,
}
