use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Analysis timed out after {0}s")]
    Timeout(u64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidRequest(msg) => AppError::Validation(msg),
            PipelineError::UnsupportedFormat { format } => AppError::UnsupportedFormat(format),
            PipelineError::Extraction { reason } => AppError::Extraction(reason),
            PipelineError::Upstream(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFormat(format) => {
                tracing::debug!("Rejected upload with format {format:?}");
                (
                    StatusCode::BAD_REQUEST,
                    "UNSUPPORTED_FORMAT",
                    "Only PDF or DOCX supported".to_string(),
                )
            }
            AppError::Extraction(reason) => {
                tracing::warn!("Extraction error: {reason}");
                (
                    StatusCode::BAD_REQUEST,
                    "EXTRACTION_ERROR",
                    "The uploaded document could not be read".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UPSTREAM_UNAVAILABLE",
                    "The evaluation service is unavailable, please retry later".to_string(),
                )
            }
            AppError::Timeout(secs) => {
                tracing::error!("Analysis exceeded {secs}s deadline");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    "The analysis took too long, please retry later".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::UpstreamError;

    #[test]
    fn test_pipeline_errors_map_to_statuses() {
        let cases = [
            (
                PipelineError::InvalidRequest("empty".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::UnsupportedFormat {
                    format: "txt".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::extraction("xref table missing"),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::Upstream(UpstreamError::Api {
                    status: 500,
                    body: String::new(),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn test_timeout_is_gateway_timeout() {
        assert_eq!(
            AppError::Timeout(30).into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
