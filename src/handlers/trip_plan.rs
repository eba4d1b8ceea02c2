//! Trip plan endpoint
//!
//! Handles POST /trip-plan: one model call turned into a validated itinerary.

use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse, AppState};
use crate::middleware::RequestId;
use crate::trip::{TripPlan, TripRequest};
use axum::{Extension, Json, extract::State};

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<TripRequest>,
) -> AppResult<Json<ApiResponse<TripPlan>>> {
    tracing::info!(
        request_id = %request_id,
        destination = %request.destination(),
        days = request.days(),
        "Trip plan requested"
    );

    let outcome = state.pipeline().plan_trip(&request, request_id).await?;
    Ok(Json(ApiResponse::with_warnings(
        outcome.data,
        outcome.warnings,
    )))
}
