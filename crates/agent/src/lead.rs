//! Lead submission
//!
//! Turns a contact form submission plus its conversation into a scored
//! `QualifiedLead`, hands it to the lead sink and marks the session.

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lead_agent_core::{
    ContactInfo, Error, LeadContact, LeadQuality, LeadScore, LeadSink, QualifiedLead, Result,
    SessionStatus, SessionUpdate,
};
use lead_agent_persistence::ConversationStore;

use crate::estimator::ProjectEstimator;
use crate::insights::InsightExtractor;
use crate::lead_scoring::LeadScorer;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const QUALIFIED_MESSAGE: &str =
    "Thank you! Our team will contact you within 24 hours to schedule a consultation.";
const UNQUALIFIED_MESSAGE: &str =
    "Thank you for your interest! We'll be in touch soon with more information.";

/// Contact form payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadSubmission {
    pub session_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service_type: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub description: Option<String>,
}

impl LeadSubmission {
    /// Check required fields and email format
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("sessionId", &self.session_id),
            ("name", &self.name),
            ("email", &self.email),
            ("serviceType", &self.service_type),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(Error::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        if !EMAIL_PATTERN.is_match(self.email.trim()) {
            return Err(Error::validation("Invalid email address"));
        }
        Ok(())
    }
}

/// Result of a lead submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadOutcome {
    pub lead_id: String,
    pub score: LeadScore,
    pub qualified: bool,
    pub message: String,
}

/// Handles contact form submissions
pub struct LeadSubmissionHandler {
    store: Arc<dyn ConversationStore>,
    sink: Arc<dyn LeadSink>,
    extractor: Arc<InsightExtractor>,
    scorer: Arc<LeadScorer>,
    estimator: Arc<ProjectEstimator>,
}

impl LeadSubmissionHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        sink: Arc<dyn LeadSink>,
        extractor: Arc<InsightExtractor>,
        scorer: Arc<LeadScorer>,
        estimator: Arc<ProjectEstimator>,
    ) -> Self {
        Self {
            store,
            sink,
            extractor,
            scorer,
            estimator,
        }
    }

    pub async fn submit(&self, submission: LeadSubmission) -> Result<LeadOutcome> {
        submission.validate()?;
        let session_id = submission.session_id.trim();

        let conversation = self
            .store
            .get_by_id(session_id)
            .await?
            .filter(|c| !c.messages.is_empty())
            .ok_or_else(|| Error::not_found("Conversation not found"))?;

        let insights = self.extractor.extract(&conversation.messages);
        let score = self.scorer.score(&insights, conversation.messages.len());
        let qualified = score.qualified;

        let service_type = self
            .estimator
            .catalog()
            .resolve(&submission.service_type)
            .map(|s| s.id.clone())
            .unwrap_or_else(|| submission.service_type.trim().to_string());
        let estimate = self.estimator.estimate(&service_type, &insights);

        let contact = LeadContact {
            name: submission.name.trim().to_string(),
            email: submission.email.trim().to_string(),
            phone: non_empty(submission.phone),
            company: non_empty(submission.company),
        };

        let lead = QualifiedLead {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            contact: contact.clone(),
            service_type,
            budget: non_empty(submission.budget),
            timeline: non_empty(submission.timeline),
            description: non_empty(submission.description),
            score: score.clone(),
            insights,
            estimate,
            created_at: Utc::now(),
        };

        if let Err(e) = self.sink.deliver(&lead).await {
            tracing::warn!(
                lead_id = %lead.id,
                sink = self.sink.name(),
                error = %e,
                "Lead delivery failed"
            );
        }

        let quality = if qualified {
            LeadQuality::High
        } else {
            LeadQuality::Medium
        };
        self.store
            .update(
                session_id,
                SessionUpdate::default()
                    .status(SessionStatus::Qualified)
                    .lead_quality(quality)
                    .contact(ContactInfo {
                        name: Some(contact.name),
                        email: Some(contact.email),
                        phone: contact.phone,
                        company: contact.company,
                    }),
            )
            .await?;

        tracing::info!(
            session_id = %session_id,
            lead_id = %lead.id,
            total = score.total,
            qualified,
            "Lead submitted"
        );

        Ok(LeadOutcome {
            lead_id: lead.id,
            score,
            qualified,
            message: if qualified {
                QUALIFIED_MESSAGE
            } else {
                UNQUALIFIED_MESSAGE
            }
            .to_string(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
