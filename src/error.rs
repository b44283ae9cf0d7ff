use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

use crate::models::job::JobStatus;
use crate::services::queue::QueueError;

/// Domain error for job lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job {0} belongs to another user")]
    Forbidden(Uuid),

    #[error("Cannot {operation} job {job_id} while it is {from}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        operation: &'static str,
    },

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
}

impl JobError {
    /// HTTP status used when the error escapes a read endpoint.
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::NotFound(_) => StatusCode::NOT_FOUND,
            JobError::Forbidden(_) => StatusCode::FORBIDDEN,
            JobError::InvalidTransition { .. } | JobError::InvalidState(_) => StatusCode::CONFLICT,
            JobError::Provider(_) => StatusCode::BAD_GATEWAY,
            JobError::Database(_) | JobError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            JobError::Database(_) | JobError::Queue(_) => {
                tracing::error!(error = %self, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, axum::Json(json!({ "ok": false, "error": message }))).into_response()
    }
}

/// Failure talking to the scrape or analysis provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Non-success HTTP response; the detail is kept verbatim for the job record.
    #[error("HTTP {status} {reason}{}", body_suffix(.body))]
    Http {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("{0}")]
    Transport(String),

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    /// Error reported by the provider inside an otherwise valid payload.
    #[error("{0}")]
    Reported(String),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}
