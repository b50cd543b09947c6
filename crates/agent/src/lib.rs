//! Lead qualification agent
//!
//! Features:
//! - Streaming chat turns with persisted history
//! - Rule-based signal extraction (budget, timeline, authority, ...)
//! - Config-driven lead scoring
//! - Background session analysis
//! - Lead submission with project estimates

pub mod analysis;
pub mod chat;
pub mod estimator;
pub mod insights;
pub mod lead;
pub mod lead_scoring;
pub mod pipeline;

pub use analysis::LeadAnalyzer;
pub use chat::{ChatEvent, ChatOrchestrator, ChatPhase, ChatRequest, ChatStream};
pub use estimator::ProjectEstimator;
pub use insights::InsightExtractor;
pub use lead::{LeadOutcome, LeadSubmission, LeadSubmissionHandler};
pub use lead_scoring::LeadScorer;
pub use pipeline::LeadPipeline;
