use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JobError;
use crate::services::analysis::AnalysisHandoff;

const QUEUE_KEY: &str = "seo_report:analysis";
const PROCESSING_KEY: &str = "seo_report:analysis:processing";

/// Analysis request serialized into Redis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedAnalysis {
    pub job_id: Uuid,
    pub enqueued_at: DateTime<Utc>,
}

/// Redis-backed hand-off between webhook ingestion and the analysis worker.
pub struct JobQueue {
    client: redis::Client,
}

impl JobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, QueueError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Enqueue an analysis run.
    pub async fn enqueue(&self, request: &QueuedAnalysis) -> Result<(), QueueError> {
        let payload = serde_json::to_string(request)?;
        self.connection()
            .await?
            .lpush::<_, _, ()>(QUEUE_KEY, &payload)
            .await?;
        Ok(())
    }

    /// Pop the oldest request, moving it to the processing list until completed.
    pub async fn dequeue(&self) -> Result<Option<QueuedAnalysis>, QueueError> {
        let payload: Option<String> = self
            .connection()
            .await?
            .rpoplpush(QUEUE_KEY, PROCESSING_KEY)
            .await?;

        Ok(payload
            .map(|p| serde_json::from_str::<QueuedAnalysis>(&p))
            .transpose()?)
    }

    /// Remove a finished request from the processing list.
    pub async fn complete(&self, request: &QueuedAnalysis) -> Result<(), QueueError> {
        let payload = serde_json::to_string(request)?;
        self.connection()
            .await?
            .lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload)
            .await?;
        Ok(())
    }

    /// Move requests left in the processing list by a worker that stopped
    /// mid-run back onto the queue. Returns how many were moved.
    ///
    /// Running a recovered request twice is harmless: a job that already left
    /// `analyzing` is skipped.
    pub async fn recover_processing(&self) -> Result<u64, QueueError> {
        let mut conn = self.connection().await?;
        let mut moved = 0;
        loop {
            let payload: Option<String> = conn.rpoplpush(PROCESSING_KEY, QUEUE_KEY).await?;
            if payload.is_none() {
                break;
            }
            moved += 1;
        }
        Ok(moved)
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// Requests waiting to be picked up.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        Ok(self.connection().await?.llen(QUEUE_KEY).await?)
    }
}

#[async_trait]
impl AnalysisHandoff for JobQueue {
    async fn hand_off(&self, job_id: Uuid) -> Result<(), JobError> {
        self.enqueue(&QueuedAnalysis {
            job_id,
            enqueued_at: Utc::now(),
        })
        .await?;
        tracing::debug!(job_id = %job_id, "Analysis queued");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
