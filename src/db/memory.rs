use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::store::{
    failure_message, JobStore, ANALYSIS_PROMPT_FROM, ANALYSIS_RETRY_FROM, COMPLETE_FROM,
    RAW_RESULTS_FROM, RESET_FROM, TRACKING_TOKEN_FROM,
};
use crate::error::JobError;
use crate::models::job::{Job, JobStatus};
use crate::models::report::SeoReport;

/// In-process job store. Each transition checks and writes under one lock, giving
/// the same compare-and-swap contract as [`PgJobStore`](crate::db::PgJobStore).
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `mutate` if the job's status is one of `from`.
    fn transition<F>(
        &self,
        job_id: Uuid,
        from: &[JobStatus],
        operation: &'static str,
        mutate: F,
    ) -> Result<Job, JobError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobError>,
    {
        let mut jobs = self.jobs.lock().map_err(|_| poisoned())?;
        let job = jobs.get_mut(&job_id).ok_or(JobError::NotFound(job_id))?;
        if !from.contains(&job.status) {
            return Err(JobError::InvalidTransition {
                job_id,
                from: job.status,
                operation,
            });
        }
        mutate(job)?;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

fn poisoned() -> JobError {
    JobError::InvalidState("job store lock poisoned".to_string())
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, prompt: &str, user_id: &str) -> Result<Job, JobError> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            original_prompt: prompt.to_string(),
            analysis_prompt: None,
            tracking_token: None,
            status: JobStatus::Pending,
            raw_results: None,
            report: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.jobs
            .lock()
            .map_err(|_| poisoned())?
            .insert(job.id, job.clone());
        Ok(job)
    }

    async fn find(&self, job_id: Uuid) -> Result<Option<Job>, JobError> {
        Ok(self.jobs.lock().map_err(|_| poisoned())?.get(&job_id).cloned())
    }

    async fn list_for_user(&self, user_id: &str, limit: i64) -> Result<Vec<Job>, JobError> {
        let jobs = self.jobs.lock().map_err(|_| poisoned())?;
        let mut owned: Vec<Job> = jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned.truncate(limit.max(0) as usize);
        Ok(owned)
    }

    async fn update_tracking_token(&self, job_id: Uuid, token: &str) -> Result<Job, JobError> {
        self.transition(job_id, TRACKING_TOKEN_FROM, "record tracking token for", |job| {
            job.tracking_token = Some(token.to_string());
            if job.status == JobStatus::Pending {
                job.status = JobStatus::Running;
            }
            Ok(())
        })
    }

    async fn record_raw_results(
        &self,
        job_id: Uuid,
        results: Vec<serde_json::Value>,
    ) -> Result<Job, JobError> {
        self.transition(job_id, RAW_RESULTS_FROM, "record raw results for", |job| {
            job.raw_results = Some(results);
            job.status = JobStatus::Analyzing;
            Ok(())
        })
    }

    async fn begin_analysis_retry(&self, job_id: Uuid) -> Result<Job, JobError> {
        self.transition(job_id, ANALYSIS_RETRY_FROM, "retry analysis for", |job| {
            if !job.has_raw_results() {
                return Err(JobError::InvalidState(format!(
                    "Job {job_id} has no raw results to analyze"
                )));
            }
            job.status = JobStatus::Analyzing;
            job.error = None;
            Ok(())
        })
    }

    async fn set_analysis_prompt(&self, job_id: Uuid, prompt: &str) -> Result<Job, JobError> {
        self.transition(job_id, ANALYSIS_PROMPT_FROM, "record analysis prompt for", |job| {
            job.analysis_prompt = Some(prompt.to_string());
            Ok(())
        })
    }

    async fn complete(&self, job_id: Uuid, report: &SeoReport) -> Result<Job, JobError> {
        self.transition(job_id, COMPLETE_FROM, "complete", |job| {
            job.status = JobStatus::Completed;
            job.report = Some(report.clone());
            job.error = None;
            job.completed_at = Some(Utc::now());
            Ok(())
        })
    }

    async fn fail_from(
        &self,
        job_id: Uuid,
        from: &[JobStatus],
        message: &str,
    ) -> Result<Job, JobError> {
        self.transition(job_id, from, "fail", |job| {
            job.status = JobStatus::Failed;
            job.error = Some(failure_message(message));
            Ok(())
        })
    }

    async fn reset(&self, job_id: Uuid) -> Result<Job, JobError> {
        self.transition(job_id, RESET_FROM, "reset", |job| {
            job.status = JobStatus::Pending;
            job.tracking_token = None;
            job.raw_results = None;
            job.report = None;
            job.error = None;
            job.analysis_prompt = None;
            job.completed_at = None;
            Ok(())
        })
    }

    async fn list_stalled(
        &self,
        states: &[JobStatus],
        updated_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Job>, JobError> {
        let jobs = self.jobs.lock().map_err(|_| poisoned())?;
        let mut stalled: Vec<Job> = jobs
            .values()
            .filter(|j| states.contains(&j.status) && j.updated_at < updated_before)
            .cloned()
            .collect();
        stalled.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        stalled.truncate(limit.max(0) as usize);
        Ok(stalled)
    }
}
