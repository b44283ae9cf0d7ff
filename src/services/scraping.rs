use garde::Validate;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::JobStore;
use crate::error::JobError;
use crate::models::job::Job;
use crate::models::scrape::{RetryAnalysisResponse, StartScrapingRequest, StartScrapingResponse};
use crate::services::analysis::AnalysisTrigger;
use crate::services::countries;
use crate::services::dispatcher::ScrapeDispatcher;
use crate::services::retry_policy::{self, RetryDecision};

/// Client-facing entry points. Every call returns an `{ok, ...}` envelope;
/// no error escapes to the caller.
pub struct ScrapingService {
    store: Arc<dyn JobStore>,
    dispatcher: ScrapeDispatcher,
    trigger: Arc<AnalysisTrigger>,
}

impl ScrapingService {
    pub fn new(
        store: Arc<dyn JobStore>,
        dispatcher: ScrapeDispatcher,
        trigger: Arc<AnalysisTrigger>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            trigger,
        }
    }

    /// Start a new job, or retry `existing_job_id`.
    ///
    /// Retries take the analysis-only path when the job's scrape already
    /// delivered results, otherwise the job is reset and scraped again.
    pub async fn start_scraping(
        &self,
        user_id: &str,
        mut request: StartScrapingRequest,
    ) -> StartScrapingResponse {
        request.prompt = request.prompt.trim().to_string();
        if let Err(report) = request.validate() {
            return StartScrapingResponse::failed(request.existing_job_id, report.to_string());
        }
        let Some(country) = countries::normalize(&request.country) else {
            return StartScrapingResponse::failed(
                request.existing_job_id,
                format!("Unsupported country: {}", request.country),
            );
        };

        let job = match request.existing_job_id {
            Some(job_id) => match self.prepare_retry(user_id, job_id).await {
                Ok(Some(job)) => job,
                Ok(None) => return StartScrapingResponse::smart_retried(job_id),
                Err(e) => return StartScrapingResponse::failed(Some(job_id), e.to_string()),
            },
            None => match self.store.create(&request.prompt, user_id).await {
                Ok(job) => {
                    metrics::counter!("scrape_jobs_total").increment(1);
                    tracing::info!(job_id = %job.id, user_id, "Scraping job created");
                    job
                }
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Failed to create scraping job");
                    return StartScrapingResponse::failed(None, e.to_string());
                }
            },
        };

        match self.dispatcher.submit(&job, country).await {
            Ok(accepted) => StartScrapingResponse::dispatched(job.id, accepted.snapshot_id),
            Err(e) => StartScrapingResponse::failed(Some(job.id), e.to_string()),
        }
    }

    /// Re-run only the analysis step of a failed job.
    pub async fn retry_analysis_only(&self, user_id: &str, job_id: Uuid) -> RetryAnalysisResponse {
        match self.analysis_only(user_id, job_id).await {
            Ok(()) => RetryAnalysisResponse::started(),
            Err(e) => RetryAnalysisResponse::failed(e.to_string()),
        }
    }

    async fn analysis_only(&self, user_id: &str, job_id: Uuid) -> Result<(), JobError> {
        let job = self.store.get(job_id, user_id).await?;
        match retry_policy::decide(&job)? {
            RetryDecision::AnalysisOnly => self.run_smart_retry(job_id).await,
            RetryDecision::FullRetry => Err(JobError::InvalidState(format!(
                "Job {job_id} has no raw results; a full retry is required"
            ))),
        }
    }

    /// Returns the reset job to re-dispatch, or `None` when the retry was served
    /// by re-running analysis.
    async fn prepare_retry(&self, user_id: &str, job_id: Uuid) -> Result<Option<Job>, JobError> {
        let job = self.store.get(job_id, user_id).await?;

        match retry_policy::decide(&job)? {
            RetryDecision::AnalysisOnly => {
                tracing::info!(job_id = %job_id, "Using smart retry - analysis only");
                self.run_smart_retry(job_id).await?;
                Ok(None)
            }
            RetryDecision::FullRetry => {
                tracing::info!(job_id = %job_id, "Full retry required");
                metrics::counter!("full_retries_total").increment(1);
                Ok(Some(self.store.reset(job_id).await?))
            }
        }
    }

    async fn run_smart_retry(&self, job_id: Uuid) -> Result<(), JobError> {
        metrics::counter!("smart_retries_total").increment(1);
        self.trigger.run(job_id).await.map(|_| ())
    }
}
