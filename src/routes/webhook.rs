use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::JobError;
use crate::models::webhook::WebhookPayload;
use crate::services::webhook::IngestOutcome;

#[derive(Debug, Deserialize)]
pub struct WebhookParams {
    #[serde(rename = "jobId")]
    pub job_id: Uuid,
}

/// POST /webhook?jobId=<id>: scrape delivery from the provider.
///
/// The job is identified by the query string only. Anything the job already
/// recorded (including analysis failures) is acknowledged with 200 so the
/// provider does not redeliver.
pub async fn receive_delivery(
    State(state): State<AppState>,
    Query(params): Query<WebhookParams>,
    Json(payload): Json<WebhookPayload>,
) -> Result<(StatusCode, Json<Value>), JobError> {
    let outcome = state.webhook.receive(params.job_id, payload).await?;

    let (status, detail) = match &outcome {
        IngestOutcome::Accepted => ("accepted", None),
        IngestOutcome::AnalysisFailed(e) => ("analysis_failed", Some(e.clone())),
        IngestOutcome::ScrapeFailed(e) => ("scrape_failed", Some(e.clone())),
        IngestOutcome::Ignored(_) => ("ignored", None),
    };

    Ok((
        StatusCode::OK,
        Json(json!({
            "received": true,
            "jobId": params.job_id,
            "outcome": status,
            "detail": detail,
        })),
    ))
}
