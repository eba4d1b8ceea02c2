//! Shuffle endpoint
//!
//! Handles POST /shuffle: suggest one replacement place.

use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse, AppState};
use crate::middleware::RequestId;
use crate::trip::{ShuffleRequest, ShuffleResult};
use axum::{Extension, Json, extract::State};

pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<ShuffleRequest>,
) -> AppResult<Json<ApiResponse<ShuffleResult>>> {
    tracing::info!(
        request_id = %request_id,
        place = %request.place_name(),
        place_type = %request.place_type(),
        "Shuffle requested"
    );

    let outcome = state.pipeline().shuffle_place(&request, request_id).await?;
    Ok(Json(ApiResponse::with_warnings(
        outcome.data,
        outcome.warnings,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::handlers::test_support::state_with;
    use crate::pipeline::PipelineError;
    use crate::trip::{Pace, TravelContext, TravelStyle};

    fn request() -> ShuffleRequest {
        ShuffleRequest::new(
            "City Palace".to_string(),
            "attraction".to_string(),
            TravelContext {
                destination: "Udaipur".to_string(),
                budget: 8000.0,
                interests: vec!["architecture".to_string()],
                travel_style: TravelStyle::Solo,
                pace: Pace::Relaxed,
                food_preferences: Vec::new(),
                weather: None,
                geotag: None,
            },
            Vec::new(),
            Vec::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_replacement() {
        let state = state_with(Ok(
            r#"{"new_place":"Jag Mandir","description":"Island palace"}"#.to_string(),
        ));

        let Json(body) = handler(State(state), Extension(RequestId::new()), ApiJson(request()))
            .await
            .unwrap();
        assert_eq!(body.data.new_place, "Jag Mandir");
        assert!(body.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_new_place_is_schema_error() {
        let state = state_with(Ok(r#"{"description":"no name"}"#.to_string()));

        let err = handler(State(state), Extension(RequestId::new()), ApiJson(request()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Pipeline(PipelineError::Schema(_))));
    }
}
