//! Axum route handlers for the Results API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::models::{MatchPercentage, RequirementsSummary};
use crate::errors::AppError;
use crate::models::analysis_record::AnalysisRecordRow;
use crate::results::store::NewAnalysisRecord;
use crate::state::AppState;

/// Body of a save request. Skill lists may be sent flat or nested under
/// `requirementsSummary`; flat lists win when both are present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveResultRequest {
    pub user_id: Option<String>,
    pub candidate_name: Option<String>,
    pub resume_file_name: Option<String>,
    pub job_description: Option<String>,
    pub match_percentage: Option<MatchPercentage>,
    pub summary: Option<String>,
    pub recommendation: Option<String>,
    pub experience: Option<Value>,
    pub requirements_summary: Option<RequirementsSummary>,
    pub required_skills: Option<Vec<String>>,
    pub candidate_skills: Option<Vec<String>>,
    pub matching_skills: Option<Vec<String>>,
    pub missing_skills: Option<Vec<String>>,
}

impl SaveResultRequest {
    pub fn into_record(self) -> Result<NewAnalysisRecord, AppError> {
        let job_description = self
            .job_description
            .filter(|jd| !jd.trim().is_empty())
            .ok_or_else(|| AppError::Validation("Job description is required".to_string()))?;

        let nested = self.requirements_summary.unwrap_or_default();

        Ok(NewAnalysisRecord {
            user_id: self.user_id.filter(|id| !id.is_empty()),
            candidate_name: self.candidate_name.unwrap_or_default(),
            resume_file_name: self.resume_file_name.unwrap_or_default(),
            job_description,
            match_percentage: self
                .match_percentage
                .and_then(|m| m.score())
                .map(i32::from),
            summary: self.summary.unwrap_or_default(),
            recommendation: self.recommendation.unwrap_or_default(),
            experience: self.experience.filter(|v| !v.is_null()),
            required_skills: self.required_skills.unwrap_or(nested.required_skills),
            candidate_skills: self.candidate_skills.unwrap_or(nested.candidate_skills),
            matching_skills: self.matching_skills.unwrap_or(nested.matching_skills),
            missing_skills: self.missing_skills.unwrap_or(nested.missing_skills),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResultResponse {
    pub success: bool,
    pub message: String,
    pub result_id: Uuid,
}

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

/// POST /api/v1/results
pub async fn handle_save_result(
    State(state): State<AppState>,
    Json(request): Json<SaveResultRequest>,
) -> Result<Json<SaveResultResponse>, AppError> {
    let record = request.into_record()?;
    let result_id = state.store.save(record).await?;

    Ok(Json(SaveResultResponse {
        success: true,
        message: "Result saved successfully".to_string(),
        result_id,
    }))
}

/// GET /api/v1/results?user_id=...
pub async fn handle_list_results(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<AnalysisRecordRow>>, AppError> {
    let results = state.store.list_for_user(&params.user_id).await?;
    Ok(Json(results))
}

/// GET /api/v1/results/:id
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisRecordRow>, AppError> {
    let result = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Result {id} not found")))?;
    Ok(Json(result))
}
