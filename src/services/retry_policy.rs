//! Retry decision for failed jobs.
//!
//! A failed job whose scrape already delivered raw results only needs the
//! analysis step re-run. Anything else has to be reset and scraped again.

use crate::error::JobError;
use crate::models::job::{Job, JobStatus};

/// How a failed job will be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-run analysis over the stored raw results.
    AnalysisOnly,
    /// Reset the job and submit a fresh scrape.
    FullRetry,
}

/// True iff the job failed after its scrape delivered non-empty raw results.
pub fn can_use_smart_retry(job: &Job) -> bool {
    job.status == JobStatus::Failed && job.has_raw_results()
}

/// Pick the retry path for a job. Only failed jobs can be retried.
pub fn decide(job: &Job) -> Result<RetryDecision, JobError> {
    if job.status != JobStatus::Failed {
        return Err(JobError::InvalidState(format!(
            "Job {} is {} and cannot be retried",
            job.id, job.status
        )));
    }

    if can_use_smart_retry(job) {
        Ok(RetryDecision::AnalysisOnly)
    } else {
        Ok(RetryDecision::FullRetry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn job(status: JobStatus, raw_results: Option<Vec<serde_json::Value>>) -> Job {
        Job {
            id: Uuid::new_v4(),
            user_id: "user_1".to_string(),
            original_prompt: "best CRM software".to_string(),
            analysis_prompt: None,
            tracking_token: Some("tok-1".to_string()),
            status,
            raw_results,
            report: None,
            error: (status == JobStatus::Failed).then(|| "analysis timeout".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_failed_with_results_is_smart_retry() {
        let j = job(JobStatus::Failed, Some(vec![json!({"answer_text": "HubSpot"})]));
        assert!(can_use_smart_retry(&j));
        assert_eq!(decide(&j).unwrap(), RetryDecision::AnalysisOnly);
    }

    #[test]
    fn test_failed_without_results_needs_full_retry() {
        let j = job(JobStatus::Failed, None);
        assert!(!can_use_smart_retry(&j));
        assert_eq!(decide(&j).unwrap(), RetryDecision::FullRetry);
    }

    #[test]
    fn test_failed_with_empty_results_needs_full_retry() {
        let j = job(JobStatus::Failed, Some(vec![]));
        assert!(!can_use_smart_retry(&j));
        assert_eq!(decide(&j).unwrap(), RetryDecision::FullRetry);
    }

    #[test]
    fn test_non_failed_jobs_never_retry() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Analyzing,
            JobStatus::Completed,
        ] {
            let j = job(status, Some(vec![json!({"answer_text": "HubSpot"})]));
            assert!(!can_use_smart_retry(&j), "{status} must not be eligible");
            assert!(matches!(decide(&j), Err(JobError::InvalidState(_))));
        }
    }
}
