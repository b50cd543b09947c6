//! Background lead analysis
//!
//! After enough turns the orchestrator asks the analyzer to re-score the
//! session and record the lead quality. Runs detached from the response.

use std::sync::Arc;

use tokio::task::JoinHandle;

use lead_agent_core::{Error, LeadQuality, LeadScore, Result, SessionStatus, SessionUpdate};
use lead_agent_persistence::ConversationStore;

use crate::insights::InsightExtractor;
use crate::lead_scoring::LeadScorer;

/// Scores a whole session and updates its lead quality
pub struct LeadAnalyzer {
    store: Arc<dyn ConversationStore>,
    extractor: Arc<InsightExtractor>,
    scorer: Arc<LeadScorer>,
}

impl LeadAnalyzer {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        extractor: Arc<InsightExtractor>,
        scorer: Arc<LeadScorer>,
    ) -> Self {
        Self {
            store,
            extractor,
            scorer,
        }
    }

    /// Score the session and apply the resulting quality
    ///
    /// Qualified sessions become high quality (and `qualified` if still
    /// active). Scores at or above the medium threshold become medium unless
    /// the session is already high. Anything lower leaves the session as is.
    pub async fn analyze_session(&self, session_id: &str) -> Result<LeadScore> {
        let conversation = self
            .store
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| Error::not_found("Conversation not found"))?;

        let insights = self.extractor.extract(&conversation.messages);
        let score = self.scorer.score(&insights, conversation.messages.len());
        let record = &conversation.conversation;

        let mut update = SessionUpdate::default();
        if score.qualified {
            if record.lead_quality != LeadQuality::High {
                update = update.lead_quality(LeadQuality::High);
            }
            if record.status == SessionStatus::Active {
                update = update.status(SessionStatus::Qualified);
            }
        } else if score.total >= self.scorer.config().thresholds.medium_score
            && record.lead_quality == LeadQuality::Unset
        {
            update = update.lead_quality(LeadQuality::Medium);
        }

        if !update.is_empty() {
            self.store.update(session_id, update).await?;
        }

        tracing::info!(
            session_id = %session_id,
            total = score.total,
            confidence = score.confidence,
            qualified = score.qualified,
            "Session analyzed"
        );

        Ok(score)
    }

    /// Run the analysis on a detached task; errors are logged
    pub fn spawn(self: &Arc<Self>, session_id: String) -> JoinHandle<()> {
        let analyzer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = analyzer.analyze_session(&session_id).await {
                tracing::warn!(session_id = %session_id, error = %e, "Lead analysis failed");
            }
        })
    }
}
