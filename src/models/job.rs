use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::report::SeoReport;

/// Lifecycle status of a scraping job.
///
/// `pending → running → analyzing → completed` is the happy path; `failed` is
/// reachable from every non-terminal state and is only left through a retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Analyzing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A prompt's scrape + analysis lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub user_id: String,
    pub original_prompt: String,
    pub analysis_prompt: Option<String>,
    /// Bright Data snapshot id.
    pub tracking_token: Option<String>,
    pub status: JobStatus,
    pub raw_results: Option<Vec<serde_json::Value>>,
    pub report: Option<SeoReport>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// True when a scrape has delivered at least one usable record.
    pub fn has_raw_results(&self) -> bool {
        self.raw_results.as_ref().is_some_and(|r| !r.is_empty())
    }
}
