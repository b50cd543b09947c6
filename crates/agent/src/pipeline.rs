//! Wiring for the chat and lead components

use std::sync::Arc;

use lead_agent_config::{ConversationConfig, LeadConfig, LlmSettings};
use lead_agent_core::{LanguageModel, LeadSink, Result};
use lead_agent_llm::PromptBuilder;
use lead_agent_persistence::ConversationStore;

use crate::analysis::LeadAnalyzer;
use crate::chat::ChatOrchestrator;
use crate::estimator::ProjectEstimator;
use crate::insights::InsightExtractor;
use crate::lead::LeadSubmissionHandler;
use crate::lead_scoring::LeadScorer;

/// Shared components built from one set of tables
#[derive(Clone)]
pub struct LeadPipeline {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub leads: Arc<LeadSubmissionHandler>,
    pub analyzer: Arc<LeadAnalyzer>,
}

impl LeadPipeline {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        llm: Arc<dyn LanguageModel>,
        sink: Arc<dyn LeadSink>,
        lead_config: &LeadConfig,
        llm_settings: &LlmSettings,
        conversation: &ConversationConfig,
    ) -> Result<Self> {
        let extractor = Arc::new(InsightExtractor::new(
            &lead_config.extraction,
            &lead_config.services,
        )?);
        let scorer = Arc::new(LeadScorer::new(lead_config.scoring.clone()));
        let estimator = Arc::new(ProjectEstimator::new(lead_config.services.clone()));

        let analyzer = Arc::new(LeadAnalyzer::new(
            store.clone(),
            extractor.clone(),
            scorer.clone(),
        ));

        let system_prompt = PromptBuilder::default()
            .with_services(&lead_config.services)
            .build();

        let orchestrator = Arc::new(ChatOrchestrator::new(
            store.clone(),
            llm,
            analyzer.clone(),
            system_prompt,
            llm_settings.clone(),
            conversation.clone(),
        ));

        let leads = Arc::new(LeadSubmissionHandler::new(
            store, sink, extractor, scorer, estimator,
        ));

        Ok(Self {
            orchestrator,
            leads,
            analyzer,
        })
    }
}
