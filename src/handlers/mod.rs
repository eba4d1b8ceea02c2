//! HTTP request handlers for the TripGenie API

use crate::config::RateLimitsConfig;
use crate::metrics::{LimitScope, Metrics};
use crate::middleware::{RateLimit, RateLimiter, rate_limit_middleware, request_id_middleware};
use crate::pipeline::TripPipeline;
use crate::storage::TripRepository;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extract;
pub mod health;
pub mod metrics;
pub mod shuffle;
pub mod trip_plan;
pub mod trips;

pub use extract::{ApiJson, ApiPath};

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<TripPipeline>,
    repository: Arc<dyn TripRepository>,
    metrics: Arc<Metrics>,
    ai_limit: RateLimit,
    chat_limit: RateLimit,
}

impl AppState {
    pub fn new(
        pipeline: Arc<TripPipeline>,
        repository: Arc<dyn TripRepository>,
        metrics: Arc<Metrics>,
        limits: &RateLimitsConfig,
    ) -> Self {
        let ai_limit = RateLimit::new(
            Arc::new(RateLimiter::new(limits.ai_max_requests, limits.ai_window())),
            LimitScope::Ai,
            metrics.clone(),
        );
        let chat_limit = RateLimit::new(
            Arc::new(RateLimiter::new(
                limits.chat_max_requests,
                limits.chat_window(),
            )),
            LimitScope::Chat,
            metrics.clone(),
        );

        Self {
            pipeline,
            repository,
            metrics,
            ai_limit,
            chat_limit,
        }
    }

    pub fn pipeline(&self) -> &TripPipeline {
        &self.pipeline
    }

    pub fn repository(&self) -> &dyn TripRepository {
        self.repository.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Success envelope: `{ "success": true, "data": .., "warnings": [..] }`
///
/// `warnings` is omitted when empty.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::with_warnings(data, Vec::new())
    }

    pub fn with_warnings(data: T, warnings: Vec<String>) -> Self {
        Self {
            success: true,
            data,
            warnings,
        }
    }
}

/// Assemble every route with its rate limits and the shared layers
///
/// The router must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for limits to be
/// keyed on the peer address.
pub fn build_router(state: AppState) -> Router {
    let ai_routes = Router::new()
        .route("/trip-plan", post(trip_plan::handler))
        .route("/shuffle", post(shuffle::handler))
        .route_layer(middleware::from_fn_with_state(
            state.ai_limit.clone(),
            rate_limit_middleware,
        ));

    let chat_routes = Router::new()
        .route("/chat", post(chat::handler))
        .route_layer(middleware::from_fn_with_state(
            state.chat_limit.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .merge(ai_routes)
        .merge(chat_routes)
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .route("/trips", post(trips::create).get(trips::list))
        .route("/trips/{id}", get(trips::get).delete(trips::delete))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
