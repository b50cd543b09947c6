//! Per-client rate limiting
//!
//! Token bucket per client key. Each bucket holds up to `burst` tokens and
//! refills at `requests_per_minute`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use thiserror::Error;

use lead_agent_config::RateLimitConfig;

use crate::state::AppState;
use crate::ServerError;

/// Buckets kept before idle ones are pruned
const MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Too many requests, retry in {retry_after_ms}ms")]
    Exceeded { retry_after_ms: u64 },
}

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket rate limiter keyed by client
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn capacity(&self) -> f64 {
        self.config.burst.max(1) as f64
    }

    fn refill_per_second(&self) -> f64 {
        self.config.requests_per_minute as f64 / 60.0
    }

    /// Take one token for `client`
    pub fn check(&self, client: &str) -> Result<(), RateLimitError> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), RateLimitError> {
        if !self.config.enabled {
            return Ok(());
        }

        let capacity = self.capacity();
        let rate = self.refill_per_second();
        let mut buckets = self.buckets.lock();

        if buckets.len() >= MAX_TRACKED_CLIENTS && !buckets.contains_key(client) {
            let full_after = Duration::from_secs_f64(capacity / rate.max(f64::EPSILON));
            buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < full_after);
        }

        let bucket = buckets.entry(client.to_string()).or_insert(TokenBucket {
            tokens: capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - bucket.tokens;
            let retry_after_ms = if rate > 0.0 {
                (missing / rate * 1000.0).ceil() as u64
            } else {
                u64::MAX
            };
            Err(RateLimitError::Exceeded { retry_after_ms })
        }
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Client key: proxy headers first, then the peer address
///
/// `"anonymous"` is only used when neither is available.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        });

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "anonymous".to_string(),
    }
}

/// Middleware limiting POST requests per client
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer);
    if let Err(e) = state.rate_limiter.check(&client) {
        tracing::warn!(
            client = %client,
            path = %request.uri().path(),
            error = %e,
            "Rate limit exceeded"
        );
        crate::metrics::record_rate_limited();
        return ServerError::from(e).into_response();
    }

    next.run(request).await
}
