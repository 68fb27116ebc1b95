use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::AssessmentError;
use crate::utils::{excerpt, MAX_EXCERPT_CHARS};

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("{0}")]
    UpstreamTimeout(String),

    #[error("{0}")]
    InvalidUpstreamPayload(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error body: `{"error": kind, "detail": text}`.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InvalidUpstreamPayload(_) | ApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            ApiError::UpstreamTimeout(_) => "UpstreamTimeout",
            ApiError::InvalidUpstreamPayload(_) => "InvalidUpstreamPayload",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::InternalError(_) | ApiError::InvalidUpstreamPayload(_) => {
                tracing::error!(error = %self, "API error occurred");
            }
            ApiError::UpstreamUnavailable(_) | ApiError::UpstreamTimeout(_) => {
                tracing::warn!(error = %self, "upstream provider failed");
            }
            _ => tracing::debug!(error = %self, "Client error"),
        }

        let body = ErrorResponse {
            error: self.error_type(),
            detail: excerpt(&self.to_string(), MAX_EXCERPT_CHARS),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AssessmentError> for ApiError {
    fn from(error: AssessmentError) -> Self {
        let detail = error.to_string();
        match error {
            AssessmentError::UpstreamUnavailable { .. } => ApiError::UpstreamUnavailable(detail),
            AssessmentError::UpstreamTimeout { .. } => ApiError::UpstreamTimeout(detail),
            AssessmentError::InvalidUpstreamPayload { .. } => {
                ApiError::InvalidUpstreamPayload(detail)
            }
            AssessmentError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ValidationError("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UpstreamUnavailable("test".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::UpstreamTimeout("test".to_string()).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::InvalidUpstreamPayload("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_assessment_errors_map_by_kind() {
        let timeout: ApiError = AssessmentError::UpstreamTimeout {
            stage: Stage::ImageAcquisition,
        }
        .into();
        assert_eq!(timeout.error_type(), "UpstreamTimeout");
        assert_eq!(timeout.to_string(), "image acquisition provider timed out");

        let unavailable: ApiError = AssessmentError::UpstreamUnavailable {
            stage: Stage::FeatureExtraction,
            status: Some(429),
            detail: "HTTP 429: quota".to_string(),
        }
        .into();
        assert_eq!(unavailable.status_code(), StatusCode::BAD_GATEWAY);

        let internal: ApiError = AssessmentError::Internal("boom".to_string()).into();
        assert_eq!(internal.error_type(), "InternalServerError");
    }

    #[tokio::test]
    async fn test_detail_is_truncated() {
        let err = ApiError::InvalidUpstreamPayload("x".repeat(2000));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "InvalidUpstreamPayload");
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.chars().count() <= MAX_EXCERPT_CHARS + 3);
    }
}
