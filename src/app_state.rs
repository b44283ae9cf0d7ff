use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::AuthVerifier;
use crate::db::{JobStore, PgJobStore};
use crate::services::{
    analysis::{AnalysisHandoff, AnalysisTrigger},
    analyzer::AnalysisProvider,
    brightdata::ScrapeProvider,
    dispatcher::ScrapeDispatcher,
    queue::JobQueue,
    scraping::ScrapingService,
    webhook::WebhookIngestor,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub store: Arc<dyn JobStore>,
    pub queue: Arc<JobQueue>,
    pub auth: Arc<AuthVerifier>,
    pub scraping: Arc<ScrapingService>,
    pub webhook: Arc<WebhookIngestor>,
}

impl AppState {
    /// Wire the lifecycle services. Webhook deliveries hand analysis off to the
    /// Redis queue; smart retries run analysis in the request.
    pub fn new(
        db: PgPool,
        queue: JobQueue,
        auth: AuthVerifier,
        scraper: Arc<dyn ScrapeProvider>,
        analyzer: Arc<dyn AnalysisProvider>,
        webhook_base_url: &str,
    ) -> Self {
        let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(db.clone()));
        let queue = Arc::new(queue);
        let analysis = Arc::new(AnalysisTrigger::new(store.clone(), analyzer));
        let dispatcher = ScrapeDispatcher::new(store.clone(), scraper, webhook_base_url);
        let scraping = Arc::new(ScrapingService::new(store.clone(), dispatcher, analysis));
        let handoff: Arc<dyn AnalysisHandoff> = queue.clone();
        let webhook = Arc::new(WebhookIngestor::new(store.clone(), handoff));

        Self {
            db,
            store,
            queue,
            auth: Arc::new(auth),
            scraping,
            webhook,
        }
    }
}
