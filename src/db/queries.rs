use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::db::store::{
    failure_message, JobStore, ANALYSIS_PROMPT_FROM, ANALYSIS_RETRY_FROM, COMPLETE_FROM,
    RAW_RESULTS_FROM, RESET_FROM, TRACKING_TOKEN_FROM,
};
use crate::error::JobError;
use crate::models::job::{Job, JobStatus};
use crate::models::report::SeoReport;

const JOB_COLUMNS: &str = "id, user_id, original_prompt, analysis_prompt, snapshot_id, status, \
                           results, seo_report, error, created_at, updated_at, completed_at";

/// PostgreSQL-backed job store. Transitions are single conditional UPDATEs so
/// concurrent writers race on the row, not in application code.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Turn the result of a conditional UPDATE into the new job, or explain why
    /// no row matched.
    async fn resolve(
        &self,
        job_id: Uuid,
        operation: &'static str,
        row: Option<PgRow>,
    ) -> Result<Job, JobError> {
        match row {
            Some(row) => Ok(job_from_row(&row)?),
            None => match self.find(job_id).await? {
                Some(current) => Err(JobError::InvalidTransition {
                    job_id,
                    from: current.status,
                    operation,
                }),
                None => Err(JobError::NotFound(job_id)),
            },
        }
    }
}

fn status_list(states: &[JobStatus]) -> Vec<String> {
    states.iter().map(ToString::to_string).collect()
}

fn job_from_row(row: &PgRow) -> Result<Job, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    let status = JobStatus::from_str(&status_str).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let results: Option<Json<Vec<serde_json::Value>>> = row.try_get("results")?;
    let report: Option<Json<SeoReport>> = row.try_get("seo_report")?;

    Ok(Job {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        original_prompt: row.try_get("original_prompt")?,
        analysis_prompt: row.try_get("analysis_prompt")?,
        tracking_token: row.try_get("snapshot_id")?,
        status,
        raw_results: results.map(|r| r.0),
        report: report.map(|r| r.0),
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, prompt: &str, user_id: &str) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            INSERT INTO scraping_jobs (id, user_id, original_prompt, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(prompt)
            .fetch_one(&self.pool)
            .await?;

        Ok(job_from_row(&row)?)
    }

    async fn find(&self, job_id: Uuid) -> Result<Option<Job>, JobError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM scraping_jobs WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(job_from_row).transpose()?)
    }

    async fn list_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Job>, JobError> {
        let sql = format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM scraping_jobs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(job_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn update_tracking_token(&self, job_id: Uuid, token: &str) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET snapshot_id = $2,
                status = CASE WHEN status = 'pending' THEN 'running' ELSE status END,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(token)
            .bind(status_list(TRACKING_TOKEN_FROM))
            .fetch_optional(&self.pool)
            .await?;

        self.resolve(job_id, "record tracking token for", row).await
    }

    async fn record_raw_results(
        &self,
        job_id: Uuid,
        results: Vec<serde_json::Value>,
    ) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET results = $2,
                status = 'analyzing',
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(Json(results))
            .bind(status_list(RAW_RESULTS_FROM))
            .fetch_optional(&self.pool)
            .await?;

        self.resolve(job_id, "record raw results for", row).await
    }

    async fn begin_analysis_retry(&self, job_id: Uuid) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET status = 'analyzing',
                error = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND status = ANY($2)
              AND results IS NOT NULL
              AND jsonb_array_length(results) > 0
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(status_list(ANALYSIS_RETRY_FROM))
            .fetch_optional(&self.pool)
            .await?;

        if row.is_none() {
            if let Some(current) = self.find(job_id).await? {
                if current.status == JobStatus::Failed {
                    return Err(JobError::InvalidState(format!(
                        "Job {job_id} has no raw results to analyze"
                    )));
                }
            }
        }
        self.resolve(job_id, "retry analysis for", row).await
    }

    async fn set_analysis_prompt(&self, job_id: Uuid, prompt: &str) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET analysis_prompt = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(prompt)
            .bind(status_list(ANALYSIS_PROMPT_FROM))
            .fetch_optional(&self.pool)
            .await?;

        self.resolve(job_id, "record analysis prompt for", row).await
    }

    async fn complete(&self, job_id: Uuid, report: &SeoReport) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET status = 'completed',
                seo_report = $2,
                error = NULL,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(Json(report))
            .bind(status_list(COMPLETE_FROM))
            .fetch_optional(&self.pool)
            .await?;

        self.resolve(job_id, "complete", row).await
    }

    async fn fail_from(
        &self,
        job_id: Uuid,
        from: &[JobStatus],
        message: &str,
    ) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET status = 'failed',
                error = $2,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(failure_message(message))
            .bind(status_list(from))
            .fetch_optional(&self.pool)
            .await?;

        self.resolve(job_id, "fail", row).await
    }

    async fn reset(&self, job_id: Uuid) -> Result<Job, JobError> {
        let sql = format!(
            r#"
            UPDATE scraping_jobs
            SET status = 'pending',
                snapshot_id = NULL,
                results = NULL,
                seo_report = NULL,
                error = NULL,
                analysis_prompt = NULL,
                completed_at = NULL,
                updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(status_list(RESET_FROM))
            .fetch_optional(&self.pool)
            .await?;

        self.resolve(job_id, "reset", row).await
    }

    async fn list_stalled(
        &self,
        states: &[JobStatus],
        updated_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Job>, JobError> {
        let sql = format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM scraping_jobs
            WHERE status = ANY($1) AND updated_at < $2
            ORDER BY updated_at ASC
            LIMIT $3
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(status_list(states))
            .bind(updated_before)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(job_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
