mod helpers;

use chrono::Utc;
use helpers::{sample_report, sample_results};
use seo_report::{
    db::{self, JobStore, PgJobStore},
    error::JobError,
    models::job::JobStatus,
    services::queue::{JobQueue, QueuedAnalysis},
};

/// Integration test: job lifecycle against PostgreSQL and the Redis hand-off.
///
/// Requires running PostgreSQL and Redis instances configured via
/// `DATABASE_URL` and `REDIS_URL`.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_postgres_job_lifecycle() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let db_pool = db::init_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let store = PgJobStore::new(db_pool);
    let user = format!("it-{}", uuid::Uuid::new_v4());

    // 1. Create
    let job = store
        .create("best CRM software", &user)
        .await
        .expect("Failed to create job");
    assert_eq!(job.status, JobStatus::Pending);

    // 2. Tracking token moves pending to running
    let job = store
        .update_tracking_token(job.id, "tok-1")
        .await
        .expect("Failed to record token");
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.tracking_token.as_deref(), Some("tok-1"));

    // 3. Raw results, then a duplicate delivery is rejected
    store
        .record_raw_results(job.id, sample_results())
        .await
        .expect("Failed to record results");
    let dup = store.record_raw_results(job.id, sample_results()).await;
    assert!(matches!(
        dup,
        Err(JobError::InvalidTransition { from: JobStatus::Analyzing, .. })
    ));

    // 4. Analysis fails, then the analysis-only retry completes
    let failed = store.fail(job.id, "analysis timeout").await.unwrap();
    assert_eq!(failed.error.as_deref(), Some("analysis timeout"));
    assert!(failed.has_raw_results());

    store.begin_analysis_retry(job.id).await.unwrap();
    store
        .set_analysis_prompt(job.id, "analyze these")
        .await
        .unwrap();

    let report = sample_report();
    let (a, b) = futures::join!(store.complete(job.id, &report), store.complete(job.id, &report));
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1, "exactly one completion wins");

    let done = store.get(job.id, &user).await.unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.report, Some(report));
    assert_eq!(done.analysis_prompt.as_deref(), Some("analyze these"));
    assert!(done.error.is_none());
    assert!(done.completed_at.is_some());

    // 5. Ownership and listing
    assert!(matches!(
        store.get(job.id, "someone-else").await,
        Err(JobError::Forbidden(_))
    ));
    let listed = store.list_for_user(&user, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, job.id);

    // 6. Completed jobs cannot fail or reset
    assert!(store.fail(job.id, "late").await.is_err());
    assert!(store.reset(job.id).await.is_err());
}

#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_redis_analysis_handoff() {
    let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL not set");
    let queue = JobQueue::new(&redis_url).expect("Failed to initialize queue");
    queue.health_check().await.expect("Redis unreachable");

    let request = QueuedAnalysis {
        job_id: uuid::Uuid::new_v4(),
        enqueued_at: Utc::now(),
    };
    queue.enqueue(&request).await.expect("Failed to enqueue");

    let dequeued = queue
        .dequeue()
        .await
        .expect("Failed to dequeue")
        .expect("No request in queue");
    assert_eq!(dequeued, request);

    queue
        .complete(&dequeued)
        .await
        .expect("Failed to complete request");

    // A request abandoned mid-run goes back onto the queue.
    let abandoned = QueuedAnalysis {
        job_id: uuid::Uuid::new_v4(),
        enqueued_at: Utc::now(),
    };
    queue.enqueue(&abandoned).await.expect("Failed to enqueue");
    queue.dequeue().await.expect("Failed to dequeue");
    let moved = queue
        .recover_processing()
        .await
        .expect("Failed to recover processing list");
    assert!(moved >= 1);

    let redelivered = queue
        .dequeue()
        .await
        .expect("Failed to dequeue")
        .expect("Recovered request missing");
    assert_eq!(redelivered, abandoned);
    queue.complete(&redelivered).await.expect("Failed to complete");
}
