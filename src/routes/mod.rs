use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

pub mod health;
pub mod jobs;
pub mod metrics;
pub mod webhook;

/// API and webhook routes (everything except `/metrics`).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/scrape", post(jobs::start_scraping))
        .route("/api/v1/jobs", get(jobs::list_jobs))
        .route("/api/v1/jobs/{job_id}", get(jobs::get_job))
        .route("/api/v1/jobs/{job_id}/retry-analysis", post(jobs::retry_analysis))
        .route("/api/v1/countries", get(jobs::list_countries))
        .route("/webhook", post(webhook::receive_delivery))
        .with_state(state)
}
