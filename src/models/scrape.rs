use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{Job, JobStatus};
use crate::models::report::SeoReport;

/// Request to start (or retry) a scrape for a prompt.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartScrapingRequest {
    #[garde(length(min = 1, max = 2000))]
    pub prompt: String,

    #[garde(skip)]
    #[serde(default)]
    pub existing_job_id: Option<Uuid>,

    #[garde(length(min = 2, max = 2))]
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

/// Client-facing envelope for `start_scraping`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartScrapingResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ScrapeData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_retry: Option<bool>,
}

/// Provider acknowledgement returned to the client; `snapshot_id` is absent for
/// analysis-only retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeData {
    pub snapshot_id: Option<String>,
}

impl StartScrapingResponse {
    pub fn dispatched(job_id: Uuid, snapshot_id: Option<String>) -> Self {
        Self {
            ok: true,
            job_id: Some(job_id),
            data: Some(ScrapeData { snapshot_id }),
            error: None,
            smart_retry: None,
        }
    }

    pub fn smart_retried(job_id: Uuid) -> Self {
        Self {
            ok: true,
            job_id: Some(job_id),
            data: Some(ScrapeData { snapshot_id: None }),
            error: None,
            smart_retry: Some(true),
        }
    }

    pub fn failed(job_id: Option<Uuid>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            job_id,
            data: None,
            error: Some(error.into()),
            smart_retry: None,
        }
    }
}

/// Client-facing envelope for `retry_analysis_only`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryAnalysisResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RetryAnalysisResponse {
    pub fn started() -> Self {
        Self {
            ok: true,
            message: Some("Analysis retry started successfully".to_string()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Owner-facing view of a job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub original_prompt: String,
    pub snapshot_id: Option<String>,
    pub result_count: usize,
    pub report: Option<SeoReport>,
    pub error: Option<String>,
    pub can_retry_analysis_only: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            original_prompt: job.original_prompt.clone(),
            snapshot_id: job.tracking_token.clone(),
            result_count: job.raw_results.as_ref().map_or(0, Vec::len),
            report: job.report.clone(),
            error: job.error.clone(),
            can_retry_analysis_only: crate::services::retry_policy::can_use_smart_retry(job),
            created_at: job.created_at,
            completed_at: job.completed_at,
        }
    }
}

/// A country the scrape provider can geo-target.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_country() {
        let req: StartScrapingRequest =
            serde_json::from_str(r#"{"prompt": "best CRM software"}"#).unwrap();
        assert_eq!(req.country, "US");
        assert!(req.existing_job_id.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let req: StartScrapingRequest = serde_json::from_str(r#"{"prompt": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_smart_retry_envelope_shape() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(StartScrapingResponse::smart_retried(id)).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["smartRetry"], true);
        assert!(json["data"]["snapshot_id"].is_null());
        assert!(json.get("error").is_none());
    }
}
