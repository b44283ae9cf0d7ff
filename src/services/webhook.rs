use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::STALLABLE;
use crate::db::JobStore;
use crate::error::JobError;
use crate::models::job::JobStatus;
use crate::models::webhook::{ScrapeOutcome, WebhookPayload};
use crate::services::analysis::AnalysisHandoff;

/// Result of ingesting one delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Raw results stored and analysis handed off successfully.
    Accepted,
    /// Raw results stored, but the analysis hand-off failed (recorded on the job).
    AnalysisFailed(String),
    /// The provider reported a scrape failure (recorded on the job).
    ScrapeFailed(String),
    /// Repeat or late delivery; the job was left untouched.
    Ignored(JobStatus),
}

/// Receives scrape-completion notifications from the provider.
pub struct WebhookIngestor {
    store: Arc<dyn JobStore>,
    handoff: Arc<dyn AnalysisHandoff>,
}

impl WebhookIngestor {
    pub fn new(store: Arc<dyn JobStore>, handoff: Arc<dyn AnalysisHandoff>) -> Self {
        Self { store, handoff }
    }

    /// Apply a delivery to the job named by the callback URL.
    ///
    /// Safe under at-least-once delivery: once a job has left `pending`/`running`
    /// further deliveries are ignored.
    pub async fn receive(
        &self,
        job_id: Uuid,
        payload: WebhookPayload,
    ) -> Result<IngestOutcome, JobError> {
        metrics::counter!("webhook_deliveries_total").increment(1);

        if self.store.find(job_id).await?.is_none() {
            return Err(JobError::NotFound(job_id));
        }

        match payload.into_outcome() {
            ScrapeOutcome::Succeeded(results) => {
                let count = results.len();
                match self.store.record_raw_results(job_id, results).await {
                    Ok(_) => {}
                    Err(JobError::InvalidTransition { from, .. }) => return Ok(ignored(job_id, from)),
                    Err(e) => return Err(e),
                }
                tracing::info!(job_id = %job_id, results = count, "Scrape results received");

                match self.handoff.hand_off(job_id).await {
                    Ok(()) => Ok(IngestOutcome::Accepted),
                    Err(err) => {
                        let message = err.to_string();
                        if !matches!(err, JobError::InvalidTransition { .. }) {
                            if let Err(e) = self.store.fail(job_id, &message).await {
                                tracing::error!(job_id = %job_id, error = %e, "Failed to record hand-off failure");
                            }
                        }
                        Ok(IngestOutcome::AnalysisFailed(message))
                    }
                }
            }
            ScrapeOutcome::Failed(message) => {
                match self.store.fail_from(job_id, STALLABLE, &message).await {
                    Ok(_) => {}
                    Err(JobError::InvalidTransition { from, .. }) => return Ok(ignored(job_id, from)),
                    Err(e) => return Err(e),
                }
                tracing::warn!(job_id = %job_id, error = %message, "Provider reported scrape failure");
                metrics::counter!("scrape_jobs_failed").increment(1);
                Ok(IngestOutcome::ScrapeFailed(message))
            }
        }
    }
}

fn ignored(job_id: Uuid, status: JobStatus) -> IngestOutcome {
    metrics::counter!("webhook_duplicates_total").increment(1);
    tracing::info!(job_id = %job_id, status = %status, "Ignoring repeat webhook delivery");
    IngestOutcome::Ignored(status)
}
