//! Prometheus metrics
//!
//! Recorded through the `metrics` facade; rendered at `/metrics` by the
//! Prometheus exporter. Recording before `init_metrics` is a no-op.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::state::AppState;
use crate::ServerError;

pub const CHAT_REQUESTS: &str = "lead_agent_chat_requests_total";
pub const TOKENS_STREAMED: &str = "lead_agent_tokens_streamed_total";
pub const STREAM_ERRORS: &str = "lead_agent_stream_errors_total";
pub const LEAD_SCORE: &str = "lead_agent_lead_score";
pub const LEADS_SUBMITTED: &str = "lead_agent_leads_submitted_total";
pub const SESSIONS_ABANDONED: &str = "lead_agent_sessions_abandoned_total";
pub const RATE_LIMITED: &str = "lead_agent_rate_limited_total";

const SCORE_BUCKETS: &[f64] = &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Safe to call more than once.
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    PROMETHEUS
        .get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .set_buckets_for_metric(Matcher::Full(LEAD_SCORE.to_string()), SCORE_BUCKETS)
                .map_err(|e| ServerError::Internal(format!("Invalid metric buckets: {}", e)))?
                .install_recorder()
                .map_err(|e| ServerError::Internal(format!("Failed to install recorder: {}", e)))?;
            describe_metrics();
            Ok(handle)
        })
        .cloned()
}

fn describe_metrics() {
    describe_counter!(CHAT_REQUESTS, "Chat messages accepted");
    describe_counter!(TOKENS_STREAMED, "Model tokens streamed to clients");
    describe_counter!(STREAM_ERRORS, "Chat turns that ended with an error event");
    describe_histogram!(LEAD_SCORE, "Scores of submitted leads");
    describe_counter!(LEADS_SUBMITTED, "Lead submissions by qualification");
    describe_counter!(SESSIONS_ABANDONED, "Sessions marked abandoned by the sweeper");
    describe_counter!(RATE_LIMITED, "Requests rejected by the rate limiter");
}

/// Prometheus text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Metrics disabled").into_response(),
    }
}

pub fn record_chat_request() {
    counter!(CHAT_REQUESTS).increment(1);
}

pub fn record_tokens(count: u64) {
    counter!(TOKENS_STREAMED).increment(count);
}

pub fn record_stream_error() {
    counter!(STREAM_ERRORS).increment(1);
}

pub fn record_lead(score: u32, qualified: bool) {
    histogram!(LEAD_SCORE).record(score as f64);
    counter!(LEADS_SUBMITTED, "qualified" => if qualified { "true" } else { "false" })
        .increment(1);
}

pub fn record_abandoned(count: u64) {
    counter!(SESSIONS_ABANDONED).increment(count);
}

pub fn record_rate_limited() {
    counter!(RATE_LIMITED).increment(1);
}
