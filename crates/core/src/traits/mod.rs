//! Core traits for pluggable backends

mod lead_sink;
mod llm;

pub use lead_sink::LeadSink;
pub use llm::LanguageModel;
