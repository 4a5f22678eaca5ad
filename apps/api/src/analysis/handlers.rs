//! Axum route handlers for the Analysis API.

use std::future::Future;
use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::analysis::{AnalysisResult, PipelineError, RawDocument};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub resume_text: String,
    /// Missing reads as empty so the pipeline rejects it with a validation error.
    #[serde(default)]
    pub job_description: String,
}

/// POST /api/v1/analyses
///
/// Evaluates pasted resume text against a job description.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let result = with_deadline(
        state.config.analysis_timeout_secs,
        state
            .pipeline
            .analyze(&request.resume_text, &request.job_description),
    )
    .await?;

    Ok(Json(result))
}

/// POST /api/v1/analyses/upload
///
/// Multipart form with a `file` (PDF or DOCX) and a `jobDescription` field.
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                upload = Some((file_name, bytes));
            }
            Some("jobDescription") => {
                job_description = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read jobDescription: {e}"))
                })?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let document = RawDocument::from_upload(&file_name, bytes)?;

    info!(
        "Analyzing uploaded resume '{file_name}' ({} bytes, {})",
        document.bytes.len(),
        document.format
    );

    let result = with_deadline(
        state.config.analysis_timeout_secs,
        state.pipeline.analyze_document(document, &job_description),
    )
    .await?;

    Ok(Json(result))
}

/// Runs the pipeline under the configured deadline, if any.
async fn with_deadline<F>(timeout_secs: Option<u64>, analysis: F) -> Result<AnalysisResult, AppError>
where
    F: Future<Output = Result<AnalysisResult, PipelineError>>,
{
    match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), analysis)
            .await
            .map_err(|_| AppError::Timeout(secs))?
            .map_err(AppError::from),
        None => analysis.await.map_err(AppError::from),
    }
}
