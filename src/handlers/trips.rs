//! Saved trip endpoints
//!
//! `POST /trips`, `GET /trips`, `GET /trips/{id}` and `DELETE /trips/{id}`.

use crate::error::{AppError, AppResult};
use crate::handlers::{ApiJson, ApiPath, ApiResponse, AppState};
use crate::middleware::RequestId;
use crate::storage::{NewTrip, SavedTrip, TripId};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeletedTrip {
    pub id: TripId,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(trip): ApiJson<NewTrip>,
) -> (StatusCode, Json<ApiResponse<SavedTrip>>) {
    let saved = state.repository().save(trip).await;
    tracing::info!(
        request_id = %request_id,
        trip_id = saved.id,
        destination = %saved.request.destination(),
        "Trip saved"
    );
    (StatusCode::CREATED, Json(ApiResponse::ok(saved)))
}

pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<SavedTrip>>> {
    Json(ApiResponse::ok(state.repository().list().await))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TripId>,
) -> AppResult<Json<ApiResponse<SavedTrip>>> {
    state
        .repository()
        .get(id)
        .await
        .map(|trip| Json(ApiResponse::ok(trip)))
        .ok_or_else(|| AppError::NotFound(format!("Trip {id}")))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<TripId>,
) -> AppResult<Json<ApiResponse<DeletedTrip>>> {
    if !state.repository().delete(id).await {
        return Err(AppError::NotFound(format!("Trip {id}")));
    }

    tracing::info!(request_id = %request_id, trip_id = id, "Trip deleted");
    Ok(Json(ApiResponse::ok(DeletedTrip { id })))
}
