use thiserror::Error;

use crate::llm_client::UpstreamError;

/// Failures the analysis pipeline surfaces to its caller.
///
/// A model reply that is not valid JSON is absent here: the
/// normalizer absorbs it into a degraded result instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported document format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Document text extraction failed: {reason}")]
    Extraction { reason: String },

    #[error("Evaluation service failure: {0}")]
    Upstream(#[from] UpstreamError),
}

impl PipelineError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        PipelineError::Extraction {
            reason: reason.into(),
        }
    }
}
