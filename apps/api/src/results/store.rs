//! Result store — persists analysis records and reads them back.
//!
//! `AppState` holds an `Arc<dyn AnalysisStore>`; `PgAnalysisStore` is the
//! production backend.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis_record::AnalysisRecordRow;

/// Fields of a record about to be inserted. The id and timestamp are assigned on save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAnalysisRecord {
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
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Inserts a record and returns its generated id.
    async fn save(&self, record: NewAnalysisRecord) -> Result<Uuid, AppError>;

    /// All records owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<AnalysisRecordRow>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisRecordRow>, AppError>;
}

pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn save(&self, record: NewAnalysisRecord) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO analysis_results
                (id, user_id, candidate_name, resume_file_name, job_description,
                 match_percentage, summary, recommendation, experience,
                 required_skills, candidate_skills, matching_skills, missing_skills)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.candidate_name)
        .bind(&record.resume_file_name)
        .bind(&record.job_description)
        .bind(record.match_percentage)
        .bind(&record.summary)
        .bind(&record.recommendation)
        .bind(&record.experience)
        .bind(&record.required_skills)
        .bind(&record.candidate_skills)
        .bind(&record.matching_skills)
        .bind(&record.missing_skills)
        .execute(&self.pool)
        .await?;

        info!(
            "Saved analysis result {id} for user {}",
            record.user_id.as_deref().unwrap_or("<anonymous>")
        );
        Ok(id)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<AnalysisRecordRow>, AppError> {
        let rows = sqlx::query_as::<_, AnalysisRecordRow>(
            "SELECT * FROM analysis_results WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AnalysisRecordRow>, AppError> {
        let row = sqlx::query_as::<_, AnalysisRecordRow>("SELECT * FROM analysis_results WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
