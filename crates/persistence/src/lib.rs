//! Persistence layer for the lead agent
//!
//! Provides storage for:
//! - Conversations and their message history
//! - Finalized leads (logged, retained in memory)

pub mod conversations;
pub mod error;
pub mod leads;

pub use conversations::{ConversationStore, InMemoryConversationStore};
pub use error::PersistenceError;
pub use leads::LoggingLeadSink;
