use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::error::JobError;
use crate::models::scrape::{
    Country, JobView, RetryAnalysisResponse, StartScrapingRequest, StartScrapingResponse,
};
use crate::services::countries::SUPPORTED_COUNTRIES;

const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

/// POST /api/v1/scrape: start a scrape, or retry an existing job.
pub async fn start_scraping(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<StartScrapingRequest>,
) -> Json<StartScrapingResponse> {
    Json(state.scraping.start_scraping(&user_id, request).await)
}

/// POST /api/v1/jobs/{job_id}/retry-analysis: re-run analysis on stored results.
pub async fn retry_analysis(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Json<RetryAnalysisResponse> {
    Json(state.scraping.retry_analysis_only(&user_id, job_id).await)
}

/// GET /api/v1/jobs/{job_id}
pub async fn get_job(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobView>, JobError> {
    let job = state.store.get(job_id, &user_id).await?;
    Ok(Json(JobView::from(&job)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/jobs: the caller's jobs, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<JobView>>, JobError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let jobs = state.store.list_for_user(&user_id, limit).await?;
    Ok(Json(jobs.iter().map(JobView::from).collect()))
}

/// GET /api/v1/countries
pub async fn list_countries() -> Json<&'static [Country]> {
    Json(SUPPORTED_COUNTRIES)
}
