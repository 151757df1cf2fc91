use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

use crate::orchestrator::GenerateError;
use crate::store::StoreError;

/// Errors returned by handlers, rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")] BadRequest(String),
    #[error("{0}")] ServiceUnavailable(String),
    #[error("{0}")] GenerationFailed(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            GenerateError::ServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            GenerateError::GenerationFailed(msg) => ApiError::GenerationFailed(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("Store error: {}", e);
        ApiError::ServiceUnavailable("Database not connected".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_generate_errors_to_status_codes() {
        let cases = [
            (GenerateError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (GenerateError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (GenerateError::GenerationFailed("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn store_errors_hide_details() {
        let err = ApiError::from(StoreError::Unavailable("connection refused 10.0.0.5".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.to_string().contains("10.0.0.5"));
    }
}
