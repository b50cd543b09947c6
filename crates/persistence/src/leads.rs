//! Logging lead sink
//!
//! Leads are NOT pushed to a CRM. Each one is written to the structured log
//! and kept in memory for inspection.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::RwLock;

use lead_agent_core::{LeadSink, QualifiedLead, Result};

use crate::PersistenceError;

/// Lead sink that logs each lead and retains the most recent ones
pub struct LoggingLeadSink {
    recent: RwLock<VecDeque<QualifiedLead>>,
    capacity: usize,
}

impl Default for LoggingLeadSink {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl LoggingLeadSink {
    /// Keep at most `capacity` leads in memory
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Retained leads, oldest first
    pub fn recent(&self) -> Vec<QualifiedLead> {
        self.recent.read().iter().cloned().collect()
    }
}

#[async_trait]
impl LeadSink for LoggingLeadSink {
    async fn deliver(&self, lead: &QualifiedLead) -> Result<()> {
        let payload = serde_json::to_string(lead).map_err(PersistenceError::from)?;

        tracing::info!(
            lead_id = %lead.id,
            session_id = %lead.session_id,
            service_type = %lead.service_type,
            score = lead.score.total,
            qualified = lead.score.qualified,
            "Lead received"
        );
        tracing::debug!(lead = %payload, "Lead payload");

        if self.capacity > 0 {
            let mut recent = self.recent.write();
            if recent.len() >= self.capacity {
                recent.pop_front();
            }
            recent.push_back(lead.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "logging"
    }
}
