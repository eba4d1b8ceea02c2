//! Body and path extractors that answer with the API error envelope
//!
//! Axum's `Json` and `Path` reject bad input with a plain-text response.
//! Request types validate themselves during deserialization, so a rejection
//! here is the client's fault and is turned into a 400
//! `{ "success": false, "error": .. }`.

use crate::error::AppError;
use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// Use instead of `axum::Json` for request bodies
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

/// Use instead of `axum::extract::Path` for path parameters
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                tracing::debug!(error = %e.body_text(), "Path parameter rejected");
                Err(AppError::Validation(format!(
                    "Invalid path parameter: {}",
                    e.body_text()
                )))
            }
            Err(rejection) => Err(AppError::Internal(rejection.body_text())),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Content-Type must be application/json".to_string()
        }
        JsonRejection::JsonSyntaxError(_) => {
            format!("Malformed JSON body: {}", inner_detail(&rejection))
        }
        _ => inner_detail(&rejection),
    };

    tracing::debug!(error = %rejection.body_text(), "Request body rejected");
    AppError::Validation(message)
}

/// The serde message without axum's generic prefix
fn inner_detail(rejection: &JsonRejection) -> String {
    let text = rejection.body_text();
    match text.split_once(": ") {
        Some((prefix, detail)) if prefix.starts_with("Failed to") => detail.to_string(),
        _ => text,
    }
}
