//! Conversation store
//!
//! Per-session message history and metadata. Sessions are created on the
//! first append and never hard-deleted.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use lead_agent_core::{
    ChatMessage, ConversationRecord, ConversationWithMessages, NewMessage, SessionStatus,
    SessionUpdate,
};

use crate::PersistenceError;

/// Conversation store trait for pluggable backends
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Most recent `max_messages` messages in chronological order.
    /// Unknown sessions yield an empty list.
    async fn get_context(
        &self,
        session_id: &str,
        max_messages: usize,
    ) -> Result<Vec<ChatMessage>, PersistenceError>;

    /// Append a message, creating the session if needed. Returns the message id.
    /// An abandoned session becomes active again.
    async fn append(&self, session_id: &str, message: NewMessage)
        -> Result<String, PersistenceError>;

    /// Full conversation with all messages
    async fn get_by_id(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationWithMessages>, PersistenceError>;

    /// Merge status, lead quality and contact fields into an existing session
    async fn update(&self, session_id: &str, update: SessionUpdate)
        -> Result<ConversationRecord, PersistenceError>;

    /// Number of stored messages (0 for unknown sessions)
    async fn message_count(&self, session_id: &str) -> Result<usize, PersistenceError>;

    /// Ids of active sessions whose last update is older than `idle_for`
    async fn idle_sessions(&self, idle_for: Duration) -> Result<Vec<String>, PersistenceError>;
}

struct SessionEntry {
    record: ConversationRecord,
    messages: Vec<ChatMessage>,
}

/// In-memory conversation store (default)
///
/// Each session lives in its own map shard entry, so appends to one session
/// are serialized while different sessions proceed independently.
#[derive(Default)]
pub struct InMemoryConversationStore {
    sessions: DashMap<String, SessionEntry>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_context(
        &self,
        session_id: &str,
        max_messages: usize,
    ) -> Result<Vec<ChatMessage>, PersistenceError> {
        let Some(entry) = self.sessions.get(session_id) else {
            return Ok(Vec::new());
        };
        let start = entry.messages.len().saturating_sub(max_messages);
        Ok(entry.messages[start..].to_vec())
    }

    async fn append(
        &self,
        session_id: &str,
        message: NewMessage,
    ) -> Result<String, PersistenceError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id = %session_id, "Creating conversation");
                SessionEntry {
                    record: ConversationRecord::new(session_id),
                    messages: Vec::new(),
                }
            });

        entry.messages.push(ChatMessage {
            id: id.clone(),
            session_id: session_id.to_string(),
            role: message.role,
            content: message.content,
            created_at: now,
            metadata: message.metadata,
        });
        entry.record.updated_at = now;
        if entry.record.status == SessionStatus::Abandoned {
            tracing::debug!(session_id = %session_id, "Reactivating abandoned conversation");
            entry.record.status = SessionStatus::Active;
        }

        Ok(id)
    }

    async fn get_by_id(
        &self,
        session_id: &str,
    ) -> Result<Option<ConversationWithMessages>, PersistenceError> {
        Ok(self.sessions.get(session_id).map(|entry| ConversationWithMessages {
            conversation: entry.record.clone(),
            messages: entry.messages.clone(),
        }))
    }

    async fn update(
        &self,
        session_id: &str,
        update: SessionUpdate,
    ) -> Result<ConversationRecord, PersistenceError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PersistenceError::NotFound(session_id.to_string()))?;
        entry.record.apply(update);
        Ok(entry.record.clone())
    }

    async fn message_count(&self, session_id: &str) -> Result<usize, PersistenceError> {
        Ok(self
            .sessions
            .get(session_id)
            .map(|entry| entry.messages.len())
            .unwrap_or(0))
    }

    async fn idle_sessions(&self, idle_for: Duration) -> Result<Vec<String>, PersistenceError> {
        let cutoff = Utc::now() - idle_for;
        Ok(self
            .sessions
            .iter()
            .filter(|entry| {
                entry.record.status == SessionStatus::Active && entry.record.updated_at < cutoff
            })
            .map(|entry| entry.key().clone())
            .collect())
    }
}
