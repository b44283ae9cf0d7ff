use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use seo_report::{
    app_state::AppState,
    auth::AuthVerifier,
    config::AppConfig,
    db,
    routes,
    services::{analyzer::OpenAiClient, brightdata::BrightDataClient, queue::JobQueue},
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Missing credentials or URLs are fatal before anything is served
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing seo-report server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("scrape_jobs_total", "Total scraping jobs created");
    metrics::describe_counter!("scrape_jobs_completed", "Jobs that produced an SEO report");
    metrics::describe_counter!("scrape_jobs_failed", "Job failures (dispatch, scrape or analysis)");
    metrics::describe_counter!("smart_retries_total", "Analysis-only retries");
    metrics::describe_counter!("full_retries_total", "Retries that re-submitted the scrape");
    metrics::describe_counter!("webhook_deliveries_total", "Provider webhook deliveries received");
    metrics::describe_counter!(
        "webhook_duplicates_total",
        "Webhook deliveries ignored as repeats or late"
    );
    metrics::describe_histogram!("analysis_duration_seconds", "Time spent in the analysis step");
    metrics::describe_gauge!("analysis_queue_depth", "Analysis requests waiting in Redis");

    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Connecting to Redis analysis queue");
    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    let auth = AuthVerifier::from_config(&config).expect("Failed to load session token key");

    let scraper = BrightDataClient::new(
        &config.brightdata_api_key,
        &config.brightdata_dataset_id,
        &config.brightdata_base_url,
    )
    .expect("Failed to initialize Bright Data client");

    let analyzer = OpenAiClient::new(
        &config.openai_api_key,
        &config.openai_model,
        &config.openai_base_url,
    )
    .expect("Failed to initialize analysis client");

    let state = AppState::new(
        db_pool,
        queue,
        auth,
        Arc::new(scraper),
        Arc::new(analyzer),
        &config.webhook_base_url,
    );

    let app = routes::router(state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // webhook deliveries can be large

    tracing::info!(
        webhook = %format!("{}/webhook", config.webhook_base_url.trim_end_matches('/')),
        "Starting seo-report on {}",
        config.bind_addr
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app).await.expect("Server error");
}
