use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::db::JobStore;
use crate::error::JobError;
use crate::models::job::{Job, JobStatus};
use crate::services::analyzer::AnalysisProvider;
use crate::services::prompts::build_analysis_prompt;
use crate::services::retry_policy::can_use_smart_retry;

/// Where webhook ingestion sends a job once its raw results are stored.
#[async_trait]
pub trait AnalysisHandoff: Send + Sync {
    async fn hand_off(&self, job_id: Uuid) -> Result<(), JobError>;
}

/// Runs the analysis step over a job's stored raw results.
pub struct AnalysisTrigger {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn AnalysisProvider>,
}

impl AnalysisTrigger {
    pub fn new(store: Arc<dyn JobStore>, provider: Arc<dyn AnalysisProvider>) -> Self {
        Self { store, provider }
    }

    /// Analyze a job that is `analyzing`, or a `failed` job that still holds raw
    /// results (analysis-only retry; the scrape is not repeated).
    ///
    /// Failures are recorded on the job and returned to the caller.
    pub async fn run(&self, job_id: Uuid) -> Result<Job, JobError> {
        let job = self
            .store
            .find(job_id)
            .await?
            .ok_or(JobError::NotFound(job_id))?;

        let job = match job.status {
            JobStatus::Analyzing => job,
            JobStatus::Failed if can_use_smart_retry(&job) => {
                tracing::info!(job_id = %job_id, "Re-running analysis on stored results");
                self.store.begin_analysis_retry(job_id).await?
            }
            other => {
                return Err(JobError::InvalidState(format!(
                    "Job {job_id} is {other} and has no analysis to run"
                )))
            }
        };

        let start = Instant::now();
        match self.analyze(&job).await {
            Ok(done) => {
                metrics::histogram!("analysis_duration_seconds").record(start.elapsed().as_secs_f64());
                metrics::counter!("scrape_jobs_completed").increment(1);
                tracing::info!(
                    job_id = %job_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Analysis complete"
                );
                Ok(done)
            }
            // Another run moved the job on; nothing of ours to record.
            Err(err @ JobError::InvalidTransition { .. }) => {
                tracing::warn!(job_id = %job_id, error = %err, "Analysis lost a race");
                Err(err)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!(job_id = %job_id, error = %message, "Analysis failed");
                metrics::counter!("scrape_jobs_failed").increment(1);
                if let Err(e) = self.store.fail(job_id, &message).await {
                    tracing::error!(job_id = %job_id, error = %e, "Failed to record analysis failure");
                }
                Err(err)
            }
        }
    }

    async fn analyze(&self, job: &Job) -> Result<Job, JobError> {
        let raw_results = job.raw_results.as_deref().unwrap_or_default();
        let prompt = build_analysis_prompt(&job.original_prompt, raw_results);
        self.store.set_analysis_prompt(job.id, &prompt).await?;

        let report = self.provider.analyze(&prompt, raw_results).await?;
        self.store.complete(job.id, &report).await
    }
}

/// What happened to one queued analysis request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Completed,
    /// Nothing to run: the job is gone or already moved on.
    Skipped(String),
    /// The provider failed; recorded on the job, which can retry analysis only.
    Failed(String),
}

/// Handle one analysis request from the queue.
///
/// Only infrastructure errors (database, queue) are returned. The request is
/// finished either way; a job left in `analyzing` is failed later by the stall
/// sweeper.
pub async fn process_request(
    trigger: &AnalysisTrigger,
    job_id: Uuid,
) -> Result<RequestOutcome, JobError> {
    match trigger.run(job_id).await {
        Ok(_) => Ok(RequestOutcome::Completed),
        Err(e @ (JobError::Database(_) | JobError::Queue(_))) => Err(e),
        Err(e @ JobError::Provider(_)) => {
            tracing::warn!(job_id = %job_id, error = %e, "Analysis failed");
            Ok(RequestOutcome::Failed(e.to_string()))
        }
        // Repeat request for a job that already moved on.
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Skipping analysis request");
            Ok(RequestOutcome::Skipped(e.to_string()))
        }
    }
}

#[async_trait]
impl AnalysisHandoff for AnalysisTrigger {
    async fn hand_off(&self, job_id: Uuid) -> Result<(), JobError> {
        self.run(job_id).await.map(|_| ())
    }
}
