use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted projection of an analysis result. `match_percentage` is NULL
/// when the score was unavailable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecordRow {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub candidate_name: String,
    pub resume_file_name: String,
    pub job_description: String,
    pub match_percentage: Option<i32>,
    pub summary: String,
    pub recommendation: String,
    pub experience: Option<Value>,
    pub required_skills: Vec<String>,
    pub candidate_skills: Vec<String>,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub created_at: DateTime<Utc>,
}
