//! Analysis Pipeline — Extractor → Synthesizer → Client → Normalizer.
//!
//! Steps run strictly in sequence, each feeding the next. Extraction and
//! upstream failures propagate unchanged; normalization cannot fail.

use std::sync::Arc;

use tracing::{info, warn};

use crate::analysis::error::PipelineError;
use crate::analysis::extractor::{extract, RawDocument};
use crate::analysis::models::AnalysisResult;
use crate::analysis::normalizer::normalize;
use crate::analysis::prompts::{build_prompt, ANALYSIS_SYSTEM};
use crate::llm_client::CompletionService;

/// What the caller hands in as the resume.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    Text(String),
    Document(RawDocument),
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    evaluator: Arc<dyn CompletionService>,
}

impl AnalysisPipeline {
    pub fn new(evaluator: Arc<dyn CompletionService>) -> Self {
        Self { evaluator }
    }

    /// Evaluates resume text against a job description.
    pub async fn analyze(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, PipelineError> {
        validate_job_description(job_description)?;
        self.evaluate_text(resume_text, job_description).await
    }

    /// Extracts the document's text, then evaluates it like [`Self::analyze`].
    pub async fn analyze_document(
        &self,
        document: RawDocument,
        job_description: &str,
    ) -> Result<AnalysisResult, PipelineError> {
        self.run(AnalysisInput::Document(document), job_description)
            .await
    }

    pub async fn run(
        &self,
        input: AnalysisInput,
        job_description: &str,
    ) -> Result<AnalysisResult, PipelineError> {
        validate_job_description(job_description)?;

        let resume_text = match input {
            AnalysisInput::Text(text) => text,
            AnalysisInput::Document(document) => extract(document).await?,
        };

        self.evaluate_text(&resume_text, job_description).await
    }

    async fn evaluate_text(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, PipelineError> {
        let prompt = build_prompt(resume_text, job_description);
        let response = self.evaluator.evaluate(&prompt, ANALYSIS_SYSTEM).await?;
        let result = normalize(&response.content);

        info!(
            "Analysis complete: match={}, recommendation={:?}, degraded={}",
            result.match_percentage,
            result.recommendation,
            result.is_degraded()
        );
        if !result.is_degraded() && result.recommendation_kind().is_none() {
            warn!(
                "Model recommendation {:?} is not one of the instructed labels",
                result.recommendation
            );
        }
        Ok(result)
    }
}

fn validate_job_description(job_description: &str) -> Result<(), PipelineError> {
    if job_description.trim().is_empty() {
        return Err(PipelineError::InvalidRequest(
            "jobDescription cannot be empty".to_string(),
        ));
    }
    Ok(())
}
