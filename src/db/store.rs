use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::JobError;
use crate::models::job::{Job, JobStatus};
use crate::models::report::SeoReport;

/// Source states each conditional update accepts. Both store implementations
/// apply a transition only when the stored status is in the listed set.
pub const TRACKING_TOKEN_FROM: &[JobStatus] =
    &[JobStatus::Pending, JobStatus::Running, JobStatus::Analyzing];
pub const RAW_RESULTS_FROM: &[JobStatus] = &[JobStatus::Pending, JobStatus::Running];
pub const ANALYSIS_PROMPT_FROM: &[JobStatus] = &[JobStatus::Analyzing];
pub const ANALYSIS_RETRY_FROM: &[JobStatus] = &[JobStatus::Failed];
pub const COMPLETE_FROM: &[JobStatus] = &[JobStatus::Analyzing];
pub const FAIL_FROM: &[JobStatus] = &[
    JobStatus::Pending,
    JobStatus::Running,
    JobStatus::Analyzing,
    JobStatus::Failed,
];
pub const RESET_FROM: &[JobStatus] = &[JobStatus::Failed];
pub const STALLABLE: &[JobStatus] = &[JobStatus::Pending, JobStatus::Running];
pub const ANALYSIS_STALLABLE: &[JobStatus] = &[JobStatus::Analyzing];

/// Durable record of scraping jobs.
///
/// Every mutating call is a compare-and-swap on `status`: when the stored status
/// is not an accepted source state the call fails with
/// [`JobError::InvalidTransition`] and nothing is written.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new `pending` job.
    async fn create(&self, prompt: &str, user_id: &str) -> Result<Job, JobError>;

    /// Unscoped lookup for internal flows (webhook, worker).
    async fn find(&self, job_id: Uuid) -> Result<Option<Job>, JobError>;

    /// Owner-scoped lookup.
    async fn get(&self, job_id: Uuid, user_id: &str) -> Result<Job, JobError> {
        let job = self.find(job_id).await?.ok_or(JobError::NotFound(job_id))?;
        if job.user_id != user_id {
            return Err(JobError::Forbidden(job_id));
        }
        Ok(job)
    }

    /// Newest first.
    async fn list_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Job>, JobError>;

    /// Record the provider's tracking token; `pending` becomes `running`.
    async fn update_tracking_token(&self, job_id: Uuid, token: &str) -> Result<Job, JobError>;

    /// Store delivered raw results and move the job to `analyzing`.
    async fn record_raw_results(
        &self,
        job_id: Uuid,
        results: Vec<serde_json::Value>,
    ) -> Result<Job, JobError>;

    /// Move a `failed` job that still holds raw results straight to `analyzing`.
    async fn begin_analysis_retry(&self, job_id: Uuid) -> Result<Job, JobError>;

    async fn set_analysis_prompt(&self, job_id: Uuid, prompt: &str) -> Result<Job, JobError>;

    async fn complete(&self, job_id: Uuid, report: &SeoReport) -> Result<Job, JobError>;

    /// Mark the job failed if its status is one of `from`.
    async fn fail_from(
        &self,
        job_id: Uuid,
        from: &[JobStatus],
        message: &str,
    ) -> Result<Job, JobError>;

    /// Fail from any non-completed state. Idempotent on already-failed jobs
    /// (the message is overwritten).
    async fn fail(&self, job_id: Uuid, message: &str) -> Result<Job, JobError> {
        self.fail_from(job_id, FAIL_FROM, message).await
    }

    /// Clear all scrape and analysis output and return a failed job to `pending`.
    async fn reset(&self, job_id: Uuid) -> Result<Job, JobError>;

    /// Jobs in one of `states` that have not changed since `updated_before`,
    /// oldest first.
    async fn list_stalled(
        &self,
        states: &[JobStatus],
        updated_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Job>, JobError>;
}

/// Failed jobs must always carry a message.
pub fn failure_message(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        "unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}
