use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::store::{ANALYSIS_STALLABLE, STALLABLE};
use crate::db::JobStore;
use crate::error::JobError;
use crate::models::job::JobStatus;

pub const STALLED_MESSAGE: &str = "scrape timed out waiting for provider webhook";
pub const ANALYSIS_STALLED_MESSAGE: &str = "analysis timed out";

const SWEEP_BATCH: i64 = 100;

/// How long a job may sit without progress before it is failed.
#[derive(Debug, Clone, Copy)]
pub struct StallTimeouts {
    /// `pending`/`running`: waiting on the provider webhook.
    pub scrape: Duration,
    /// `analyzing`: measured from the last write, which is the analysis prompt
    /// once a run has started.
    pub analysis: Duration,
}

/// Fail jobs that stopped making progress.
///
/// Stalled scrapes never received raw results, so their retry is a full re-scrape.
/// Stalled analyses keep their raw results and retry analysis only. Jobs that move
/// on between the listing and the update are left alone.
pub async fn fail_stalled_jobs(
    store: &dyn JobStore,
    timeouts: StallTimeouts,
    now: DateTime<Utc>,
) -> Result<Vec<Uuid>, JobError> {
    let mut failed = sweep(store, STALLABLE, now - timeouts.scrape, STALLED_MESSAGE).await?;
    failed.extend(
        sweep(
            store,
            ANALYSIS_STALLABLE,
            now - timeouts.analysis,
            ANALYSIS_STALLED_MESSAGE,
        )
        .await?,
    );
    Ok(failed)
}

async fn sweep(
    store: &dyn JobStore,
    states: &[JobStatus],
    updated_before: DateTime<Utc>,
    message: &str,
) -> Result<Vec<Uuid>, JobError> {
    let stalled = store.list_stalled(states, updated_before, SWEEP_BATCH).await?;
    let mut failed = Vec::with_capacity(stalled.len());

    for job in stalled {
        match store.fail_from(job.id, states, message).await {
            Ok(_) => {
                tracing::warn!(
                    job_id = %job.id,
                    status = %job.status,
                    snapshot_id = ?job.tracking_token,
                    reason = message,
                    "Failing stalled job"
                );
                metrics::counter!("scrape_jobs_failed").increment(1);
                failed.push(job.id);
            }
            Err(JobError::InvalidTransition { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(failed)
}
