//! HTTP Endpoints
//!
//! REST and SSE API for the chat widget.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Json, Query, State},
    http::{HeaderValue, Method},
    middleware,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Router,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use lead_agent_agent::{ChatEvent, ChatRequest, LeadSubmission};

use crate::metrics::{self, metrics_handler};
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;
use crate::ServerError;

/// Time allowed to produce response headers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        // Chat
        .route("/api/chat/message", post(send_message).get(chat_status))
        .route("/api/chat/lead", post(submit_lead))
        .route("/api/chat/history", get(chat_history))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        } else {
            tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    body.map(|Json(value)| value).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        ServerError::InvalidRequest("Invalid request body".to_string())
    })
}

/// Stream the assistant's reply as server-sent events
async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ServerError> {
    let request = json_body(body)?;
    let events = state.orchestrator.handle(request).await?;
    metrics::record_chat_request();

    let stream = events.map(|event| {
        match &event {
            ChatEvent::Token { .. } => metrics::record_tokens(1),
            ChatEvent::Error { .. } => metrics::record_stream_error(),
            ChatEvent::Done { .. } => {}
        }
        Event::default().json_data(&event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Provider configuration status
async fn chat_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let configured = state.get_config().llm.is_configured();
    Json(serde_json::json!({
        "status": "ok",
        "configured": configured,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Submit the contact form for a session
async fn submit_lead(
    State(state): State<AppState>,
    body: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let submission = json_body(body)?;
    let outcome = state.leads.submit(submission).await?;
    metrics::record_lead(outcome.score.total, outcome.qualified);

    Ok(Json(serde_json::json!({
        "success": true,
        "leadId": outcome.lead_id,
        "score": outcome.score.total,
        "qualified": outcome.qualified,
        "message": outcome.message,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryQuery {
    session_id: Option<String>,
}

/// Full conversation for a session
async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let session_id = query
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ServerError::InvalidRequest("sessionId is required".to_string()))?;

    let conversation = state
        .store
        .get_by_id(session_id.trim())
        .await
        .map_err(lead_agent_core::Error::from)?
        .ok_or_else(|| ServerError::NotFound("Conversation not found".to_string()))?;

    let count = conversation.messages.len();
    Ok(Json(serde_json::json!({
        "conversation": conversation.conversation,
        "messages": conversation.messages,
        "count": count,
    })))
}

/// Liveness check
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.get_config();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": config.environment,
        "llm_configured": config.llm.is_configured(),
    }))
}
