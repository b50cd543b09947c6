//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;

use lead_agent_agent::{ChatOrchestrator, LeadPipeline, LeadSubmissionHandler};
use lead_agent_config::{LeadConfig, Settings};
use lead_agent_core::{LanguageModel, LeadSink};
use lead_agent_persistence::{ConversationStore, InMemoryConversationStore, LoggingLeadSink};

use crate::rate_limit::RateLimiter;
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration; handlers read it per request
    pub config: Arc<RwLock<Settings>>,
    pub store: Arc<dyn ConversationStore>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub leads: Arc<LeadSubmissionHandler>,
    pub rate_limiter: Arc<RateLimiter>,
    /// Prometheus handle when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// State over an in-memory store and the logging lead sink
    pub fn new(
        config: Settings,
        lead_config: &LeadConfig,
        llm: Arc<dyn LanguageModel>,
    ) -> Result<Self, ServerError> {
        Self::with_backends(
            config,
            lead_config,
            llm,
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(LoggingLeadSink::default()),
        )
    }

    /// State with an explicit store and lead sink
    pub fn with_backends(
        config: Settings,
        lead_config: &LeadConfig,
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn ConversationStore>,
        sink: Arc<dyn LeadSink>,
    ) -> Result<Self, ServerError> {
        let pipeline = LeadPipeline::new(
            store.clone(),
            llm,
            sink,
            lead_config,
            &config.llm,
            &config.conversation,
        )?;

        Ok(Self {
            rate_limiter: Arc::new(RateLimiter::new(config.server.rate_limit.clone())),
            config: Arc::new(RwLock::new(config)),
            store,
            orchestrator: pipeline.orchestrator,
            leads: pipeline.leads,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a read guard to the current configuration
    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }
}
