use std::sync::Arc;
use uuid::Uuid;

use crate::db::JobStore;
use crate::error::JobError;
use crate::models::job::Job;
use crate::services::brightdata::{ScrapeAccepted, ScrapeProvider, ScrapeRequest};
use crate::services::prompts::build_scrape_prompt;

/// Submits scrapes to the provider and records the returned tracking token.
pub struct ScrapeDispatcher {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn ScrapeProvider>,
    webhook_base_url: String,
}

impl ScrapeDispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn ScrapeProvider>,
        webhook_base_url: &str,
    ) -> Self {
        Self {
            store,
            provider,
            webhook_base_url: webhook_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Delivery address for a job. The job id travels only in the query string.
    pub fn callback_url(&self, job_id: Uuid) -> String {
        format!("{}/webhook?jobId={}", self.webhook_base_url, job_id)
    }

    /// Submit a scrape for `job`.
    ///
    /// A provider or transport failure marks the job failed with the verbatim
    /// detail and is returned to the caller.
    pub async fn submit(&self, job: &Job, country: &str) -> Result<ScrapeAccepted, JobError> {
        let request = ScrapeRequest {
            prompt: build_scrape_prompt(&job.original_prompt),
            country: country.to_string(),
            callback_url: self.callback_url(job.id),
        };

        let accepted = match self.provider.submit(&request).await {
            Ok(accepted) => accepted,
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(job_id = %job.id, error = %message, "Scrape dispatch failed");
                metrics::counter!("scrape_jobs_failed").increment(1);
                if let Err(e) = self.store.fail(job.id, &message).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to record dispatch failure");
                }
                return Err(err.into());
            }
        };

        if let Some(token) = accepted.snapshot_id.as_deref() {
            match self.store.update_tracking_token(job.id, token).await {
                Ok(_) => {}
                // The webhook beat the dispatch response and already finished the job.
                Err(JobError::InvalidTransition { from, .. }) if from.is_terminal() => {
                    tracing::warn!(
                        job_id = %job.id,
                        snapshot_id = token,
                        status = %from,
                        "Tracking token arrived after job finished"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            job_id = %job.id,
            snapshot_id = ?accepted.snapshot_id,
            country,
            "Scrape dispatched"
        );

        Ok(accepted)
    }
}
