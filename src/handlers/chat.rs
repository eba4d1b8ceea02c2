//! Chat endpoint handler
//!
//! Handles POST /chat. The model's reply is returned verbatim; no JSON is
//! expected from it.

use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse, AppState};
use crate::middleware::RequestId;
use crate::trip::ChatRequest;
use axum::{Extension, Json, extract::State};
use serde::Serialize;

/// `data` of a successful chat response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub message: String,
}

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatReply>>> {
    tracing::debug!(
        request_id = %request_id,
        message_length = request.message().chars().count(),
        has_context = request.context().is_some(),
        "Chat message received"
    );

    let message = state.pipeline().chat(&request, request_id).await?;
    Ok(Json(ApiResponse::ok(ChatReply { message })))
}
