//! Lead delivery trait

use async_trait::async_trait;

use crate::{QualifiedLead, Result};

/// Destination for finalized leads (CRM, email, queue)
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Hand off a lead. Called once per successful submission.
    async fn deliver(&self, lead: &QualifiedLead) -> Result<()>;

    /// Sink name for logging
    fn name(&self) -> &str;
}
