//! Per-client fixed-window rate limiting
//!
//! Each limiter counts requests per client IP inside a fixed window. When a
//! client exceeds its budget the request is rejected with 429 and the usual
//! error envelope before any model call is made.

use crate::error::AppError;
use crate::metrics::{LimitScope, Metrics};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Bucket used when the client address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Windows are swept once the map holds this many clients
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Rejection carrying how long until the client's window resets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitExceeded {
    pub retry_after: Duration,
}

/// Fixed-window request counter keyed by client
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request from `client`
    pub fn check(&self, client: &str) -> Result<(), LimitExceeded> {
        self.check_at(client, Instant::now())
    }

    /// Count one request from `client` at time `now`
    pub fn check_at(&self, client: &str, now: Instant) -> Result<(), LimitExceeded> {
        // A panic while holding the lock cannot leave the counters inconsistent
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if clients.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, entry| now.duration_since(entry.started) < window);
        }

        let entry = clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            return Err(LimitExceeded {
                retry_after: self.window.saturating_sub(elapsed),
            });
        }

        entry.count += 1;
        Ok(())
    }
}

/// State for [`rate_limit_middleware`]
#[derive(Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    scope: LimitScope,
    metrics: Arc<Metrics>,
}

impl RateLimit {
    pub fn new(limiter: Arc<RateLimiter>, scope: LimitScope, metrics: Arc<Metrics>) -> Self {
        Self {
            limiter,
            scope,
            metrics,
        }
    }

    fn rejection_message(&self) -> &'static str {
        match self.scope {
            LimitScope::Ai => "Too many AI requests, please try again later",
            LimitScope::Chat => "Too many chat messages, please slow down",
        }
    }
}

/// Client address: socket peer, else first `x-forwarded-for` entry
pub fn client_key(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    if let Some(peer) = peer {
        return peer.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Reject the request with 429 once the client's window is exhausted
pub async fn rate_limit_middleware(
    State(limit): State<RateLimit>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(peer, request.headers());

    match limit.limiter.check(&client) {
        Ok(()) => next.run(request).await,
        Err(exceeded) => {
            limit.metrics.record_rate_limited(limit.scope);
            tracing::warn!(
                client = %client,
                scope = limit.scope.as_str(),
                max_requests = limit.limiter.max_requests(),
                window_seconds = limit.limiter.window().as_secs(),
                retry_after_seconds = exceeded.retry_after.as_secs(),
                "Request blocked by rate limiter"
            );

            let mut response =
                AppError::RateLimited(limit.rejection_message().to_string()).into_response();
            let retry_after = exceeded.retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}
