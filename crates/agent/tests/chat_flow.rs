//! Integration tests for the chat flow (request -> store -> model -> events)
//!
//! The model is a scripted fake; storage is the in-memory store.

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use lead_agent_agent::{ChatEvent, ChatRequest, LeadPipeline, LeadSubmission};
use lead_agent_config::{ConversationConfig, LeadConfig, LlmSettings};
use lead_agent_core::{
    Error, FinishReason, GenerateRequest, LanguageModel, LeadQuality, MessageRole, Result,
    SessionStatus, StreamChunk,
};
use lead_agent_persistence::{ConversationStore, InMemoryConversationStore, LoggingLeadSink};

/// Streams fixed tokens, optionally failing part way through
struct ScriptedLlm {
    tokens: Vec<&'static str>,
    fail_after: Option<usize>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedLlm {
    fn replying(tokens: Vec<&'static str>) -> Self {
        Self {
            tokens,
            fail_after: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_after(tokens: Vec<&'static str>, fail_after: usize) -> Self {
        Self {
            fail_after: Some(fail_after),
            ..Self::replying(tokens)
        }
    }

    fn last_request(&self) -> GenerateRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    fn generate_stream<'a>(
        &'a self,
        request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'a>> {
        self.requests.lock().unwrap().push(request);

        let mut items: Vec<Result<StreamChunk>> = Vec::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if self.fail_after == Some(i) {
                items.push(Err(Error::Llm("HTTP 529: overloaded".to_string())));
                return Box::pin(futures::stream::iter(items));
            }
            items.push(Ok(StreamChunk::text(*token)));
        }
        if self.fail_after.is_some() {
            items.push(Err(Error::Llm("connection reset".to_string())));
        } else {
            items.push(Ok(StreamChunk::final_chunk(FinishReason::Stop)));
        }
        Box::pin(futures::stream::iter(items))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct Harness {
    store: Arc<InMemoryConversationStore>,
    llm: Arc<ScriptedLlm>,
    sink: Arc<LoggingLeadSink>,
    pipeline: LeadPipeline,
}

fn harness_with(llm: ScriptedLlm, conversation: ConversationConfig) -> Harness {
    let store = Arc::new(InMemoryConversationStore::new());
    let llm = Arc::new(llm);
    let sink = Arc::new(LoggingLeadSink::default());
    let pipeline = LeadPipeline::new(
        store.clone(),
        llm.clone(),
        sink.clone(),
        &LeadConfig::default(),
        &LlmSettings::default(),
        &conversation,
    )
    .unwrap();
    Harness {
        store,
        llm,
        sink,
        pipeline,
    }
}

fn harness(llm: ScriptedLlm) -> Harness {
    harness_with(llm, ConversationConfig::default())
}

async fn run_turn(harness: &Harness, request: ChatRequest) -> Vec<ChatEvent> {
    harness
        .pipeline
        .orchestrator
        .handle(request)
        .await
        .unwrap()
        .collect()
        .await
}

fn done_session(events: &[ChatEvent]) -> String {
    match events.last() {
        Some(ChatEvent::Done { session_id, .. }) => session_id.clone(),
        other => panic!("expected done event, got {:?}", other),
    }
}

async fn wait_for_quality(store: &InMemoryConversationStore, session_id: &str) -> LeadQuality {
    for _ in 0..50 {
        let record = store.get_by_id(session_id).await.unwrap().unwrap().conversation;
        if record.lead_quality != LeadQuality::Unset {
            return record.lead_quality;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    LeadQuality::Unset
}

#[tokio::test]
async fn test_new_session_streams_and_persists() {
    let h = harness(ScriptedLlm::replying(vec!["Hi", " there", "!"]));

    let events = run_turn(&h, ChatRequest::new("  I need a website  ")).await;

    assert_eq!(
        &events[..3],
        &[
            ChatEvent::Token { content: "Hi".to_string() },
            ChatEvent::Token { content: " there".to_string() },
            ChatEvent::Token { content: "!".to_string() },
        ]
    );
    let session_id = done_session(&events);
    assert_eq!(session_id.len(), 36);

    let conversation = h.store.get_by_id(&session_id).await.unwrap().unwrap();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
    assert_eq!(conversation.messages[0].content, "I need a website");
    assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
    assert_eq!(conversation.messages[1].content, "Hi there!");

    if let Some(ChatEvent::Done { message_id, .. }) = events.last() {
        assert_eq!(message_id, &conversation.messages[1].id);
    }
}

#[tokio::test]
async fn test_existing_session_sends_history() {
    let h = harness(ScriptedLlm::replying(vec!["ok"]));

    let first = run_turn(&h, ChatRequest::new("hello")).await;
    let session_id = done_session(&first);
    run_turn(&h, ChatRequest::new("tell me more").with_session(&session_id)).await;

    let request = h.llm.last_request();
    assert!(request.system.contains("Web Development"));
    let contents: Vec<_> = request.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hello", "ok", "tell me more"]);
}

#[tokio::test]
async fn test_context_window_limits_history() {
    let conversation = ConversationConfig {
        max_messages_in_context: 3,
        ..Default::default()
    };
    let h = harness_with(ScriptedLlm::replying(vec!["ok"]), conversation);

    let session_id = done_session(&run_turn(&h, ChatRequest::new("one")).await);
    run_turn(&h, ChatRequest::new("two").with_session(&session_id)).await;
    run_turn(&h, ChatRequest::new("three").with_session(&session_id)).await;

    let contents: Vec<_> = h
        .llm
        .last_request()
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["two", "ok", "three"]);
}

#[tokio::test]
async fn test_validation_rejected_before_persistence() {
    let conversation = ConversationConfig {
        max_message_length: 10,
        ..Default::default()
    };
    let h = harness_with(ScriptedLlm::replying(vec!["ok"]), conversation);

    let err = h
        .pipeline
        .orchestrator
        .handle(ChatRequest::new("   ").with_session("s1"))
        .await
        .err()
        .unwrap();
    assert_eq!(err, Error::Validation("Message is required".to_string()));

    let err = h
        .pipeline
        .orchestrator
        .handle(ChatRequest::new("this is far too long").with_session("s1"))
        .await
        .err()
        .unwrap();
    assert!(err.is_client_error());

    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_provider_error_emits_error_event() {
    let h = harness(ScriptedLlm::failing_after(vec!["partial", "never"], 1));

    let events = run_turn(&h, ChatRequest::new("hello").with_session("s1")).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], ChatEvent::Token { content: "partial".to_string() });
    assert!(matches!(events[1], ChatEvent::Error { .. }));

    // Only the user turn is kept
    let conversation = h.store.get_by_id("s1").await.unwrap().unwrap();
    assert_eq!(conversation.messages.len(), 1);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_dropped_stream_keeps_user_message() {
    let h = harness(ScriptedLlm::replying(vec!["a", "b", "c"]));

    {
        let mut stream = h
            .pipeline
            .orchestrator
            .handle(ChatRequest::new("hello").with_session("s1"))
            .await
            .unwrap();
        let first = stream.next().await.unwrap();
        assert_eq!(first, ChatEvent::Token { content: "a".to_string() });
    }

    assert_eq!(h.store.message_count("s1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_analysis_skipped_below_threshold() {
    let h = harness(ScriptedLlm::replying(vec!["Great"]));
    h.store
        .append("s1", lead_agent_core::NewMessage::user("I'm the CEO"))
        .await
        .unwrap();

    // 3 messages after this turn
    let events = run_turn(
        &h,
        ChatRequest::new("Budget is $30k and we need it in 2 months").with_session("s1"),
    )
    .await;
    done_session(&events);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let record = h.store.get_by_id("s1").await.unwrap().unwrap().conversation;
    assert_eq!(h.store.message_count("s1").await.unwrap(), 3);
    assert_eq!(record.lead_quality, LeadQuality::Unset);
    assert_eq!(record.status, SessionStatus::Active);
}

#[tokio::test]
async fn test_analysis_runs_after_enough_messages() {
    let h = harness(ScriptedLlm::replying(vec!["Great"]));

    let session_id = done_session(&run_turn(&h, ChatRequest::new("I'm the CEO")).await);
    run_turn(
        &h,
        ChatRequest::new("Budget is $30k and we need it in 2 months").with_session(&session_id),
    )
    .await;

    assert_eq!(wait_for_quality(&h.store, &session_id).await, LeadQuality::High);
    let record = h.store.get_by_id(&session_id).await.unwrap().unwrap().conversation;
    assert_eq!(record.status, SessionStatus::Qualified);
}

#[tokio::test]
async fn test_chat_then_lead_submission() {
    let h = harness(ScriptedLlm::replying(vec!["Sounds good"]));

    let session_id = done_session(
        &run_turn(
            &h,
            ChatRequest::new("We need an AI chatbot, budget $60k, I'm the founder"),
        )
        .await,
    );

    let outcome = h
        .pipeline
        .leads
        .submit(LeadSubmission {
            session_id: session_id.clone(),
            name: "Sam Okafor".to_string(),
            email: "sam@example.com".to_string(),
            service_type: "AI Solutions".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(outcome.qualified);
    let leads = h.sink.recent();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].service_type, "ai-solutions");
    assert_eq!(leads[0].insights.service_type.as_deref(), Some("ai-solutions"));

    let record = h.store.get_by_id(&session_id).await.unwrap().unwrap().conversation;
    assert_eq!(record.contact.email.as_deref(), Some("sam@example.com"));
}
