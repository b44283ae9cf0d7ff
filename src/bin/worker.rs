use seo_report::{
    config::AppConfig,
    db::{self, JobStore, PgJobStore},
    services::{
        analysis::{self, AnalysisTrigger, RequestOutcome},
        analyzer::OpenAiClient,
        queue::JobQueue,
        sweeper::{self, StallTimeouts},
    },
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000; // 1 second
const SWEEP_INTERVAL_SECS: u64 = 60;

struct Worker {
    store: Arc<dyn JobStore>,
    queue: JobQueue,
    analysis: AnalysisTrigger,
    timeouts: StallTimeouts,
}

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting analysis worker");

    let config = AppConfig::from_env().expect("Failed to load configuration");

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Initializing services");
    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db_pool));
    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");
    let analyzer = OpenAiClient::new(
        &config.openai_api_key,
        &config.openai_model,
        &config.openai_base_url,
    )
    .expect("Failed to initialize analysis client");

    let worker = Worker {
        analysis: AnalysisTrigger::new(store.clone(), Arc::new(analyzer)),
        store,
        queue,
        timeouts: StallTimeouts {
            scrape: chrono::Duration::seconds(config.scrape_timeout_secs as i64),
            analysis: chrono::Duration::seconds(config.analysis_timeout_secs as i64),
        },
    };

    match worker.queue.recover_processing().await {
        Ok(0) => {}
        Ok(moved) => tracing::warn!(moved, "Re-queued abandoned analysis requests"),
        Err(e) => tracing::error!(error = %e, "Failed to recover abandoned analysis requests"),
    }

    tracing::info!(
        scrape_timeout_secs = config.scrape_timeout_secs,
        analysis_timeout_secs = config.analysis_timeout_secs,
        "Worker ready, starting analysis loop"
    );

    let mut last_sweep: Option<Instant> = None;
    loop {
        if last_sweep.map_or(true, |t| t.elapsed() >= Duration::from_secs(SWEEP_INTERVAL_SECS)) {
            sweep(&worker).await;
            last_sweep = Some(Instant::now());
        }

        match process_next_job(&worker).await {
            Ok(true) => {
                tracing::debug!("Analysis processed, checking for next request");
            }
            Ok(false) => {
                tracing::trace!("No analysis requests, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error processing analysis request, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Run the next queued analysis.
/// Returns Ok(true) if a request was handled, Ok(false) if the queue was empty.
async fn process_next_job(worker: &Worker) -> Result<bool, Box<dyn std::error::Error>> {
    let request = match worker.queue.dequeue().await? {
        Some(r) => r,
        None => return Ok(false),
    };

    tracing::info!(
        job_id = %request.job_id,
        queued_for_ms = (chrono::Utc::now() - request.enqueued_at).num_milliseconds(),
        "Processing analysis request"
    );

    let result = analysis::process_request(&worker.analysis, request.job_id).await;

    // Finished either way; a job the failed run left in `analyzing` is picked up
    // by the stall sweep.
    worker.queue.complete(&request).await?;

    if result? == RequestOutcome::Completed {
        tracing::info!(job_id = %request.job_id, "Job completed successfully");
    }
    Ok(true)
}

async fn sweep(worker: &Worker) {
    match sweeper::fail_stalled_jobs(worker.store.as_ref(), worker.timeouts, chrono::Utc::now()).await {
        Ok(failed) if !failed.is_empty() => {
            tracing::warn!(count = failed.len(), "Failed stalled jobs");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "Stalled job sweep failed"),
    }
}
