//! Core traits and types for the lead qualification agent
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation records and chat messages
//! - Qualification insights and lead scores
//! - LLM request/stream types
//! - Traits for pluggable backends (LLM, lead delivery)
//! - Error types

pub mod conversation;
pub mod error;
pub mod insights;
pub mod lead;
pub mod llm_types;
pub mod traits;

pub use conversation::{
    ChatMessage, ContactInfo, ConversationRecord, ConversationWithMessages, LeadQuality,
    MessageRole, NewMessage, SessionStatus, SessionUpdate,
};
pub use error::{Error, Result};
pub use insights::{
    BudgetRange, CompanySize, DecisionAuthority, Insights, ProjectScope, Timeline, Urgency,
};
pub use lead::{
    LeadContact, LeadRecommendation, LeadScore, ProjectEstimate, QualifiedLead, ScoreBreakdown,
};
pub use llm_types::{FinishReason, GenerateRequest, Message, Role, StreamChunk};
pub use traits::{LanguageModel, LeadSink};
