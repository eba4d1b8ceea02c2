//! Health check endpoint
//!
//! Liveness only: reports which provider is configured without calling it.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
}

pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let gateway = state.pipeline().gateway();
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            provider: gateway.provider_name().to_string(),
            model: gateway.model().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::state_with;

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let state = state_with(Ok("{}".to_string()));
        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.provider, "canned");
        assert_eq!(body.model, "test-model");
    }
}
