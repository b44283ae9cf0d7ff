//! Test doubles for the external providers and a wired-up service stack.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use seo_report::db::{JobStore, MemoryJobStore};
use seo_report::error::ProviderError;
use seo_report::models::report::{SeoReport, SourceMention};
use seo_report::services::analysis::AnalysisTrigger;
use seo_report::services::analyzer::AnalysisProvider;
use seo_report::services::brightdata::{ScrapeAccepted, ScrapeProvider, ScrapeRequest};
use seo_report::services::dispatcher::ScrapeDispatcher;
use seo_report::services::scraping::ScrapingService;
use seo_report::services::webhook::WebhookIngestor;

pub const WEBHOOK_BASE: &str = "https://hooks.example.com";

// =============================================================================
// Mock scrape provider
// =============================================================================

/// Scrape provider returning queued responses and recording every submission.
#[derive(Default)]
pub struct MockScrapeProvider {
    responses: Mutex<VecDeque<Result<ScrapeAccepted, ProviderError>>>,
    calls: Mutex<Vec<ScrapeRequest>>,
}

impl MockScrapeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(self, token: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ScrapeAccepted {
            snapshot_id: Some(token.to_string()),
        }));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<ScrapeRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ScrapeProvider for MockScrapeProvider {
    async fn submit(&self, request: &ScrapeRequest) -> Result<ScrapeAccepted, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ScrapeAccepted::default()))
    }
}

// =============================================================================
// Mock analysis provider
// =============================================================================

/// Analysis provider returning queued responses; defaults to [`sample_report`].
#[derive(Default)]
pub struct MockAnalysisProvider {
    responses: Mutex<VecDeque<Result<SeoReport, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockAnalysisProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(self, report: SeoReport) -> Self {
        self.responses.lock().unwrap().push_back(Ok(report));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalysisProvider for MockAnalysisProvider {
    async fn analyze(&self, prompt: &str, _raw_results: &[Value]) -> Result<SeoReport, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sample_report()))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn sample_report() -> SeoReport {
    SeoReport {
        summary: "HubSpot and Salesforce dominate AI answers for CRM queries".to_string(),
        key_insights: vec!["Review sites are cited more than vendor pages".to_string()],
        top_sources: vec![SourceMention {
            domain: "g2.com".to_string(),
            url: Some("https://www.g2.com/categories/crm".to_string()),
            mentions: 3,
        }],
        keywords: vec!["crm".to_string(), "small business crm".to_string()],
        recommendations: vec!["Get listed on G2 comparison pages".to_string()],
        content_gaps: vec!["Pricing comparisons".to_string()],
    }
}

pub fn sample_results() -> Vec<Value> {
    vec![json!({
        "url": "https://www.perplexity.ai",
        "prompt": "best CRM software",
        "answer_text": "The best CRM tools are HubSpot, Salesforce and Pipedrive.",
        "sources": [{"url": "https://www.g2.com/categories/crm", "title": "G2"}],
        "citations": ["https://www.hubspot.com"],
    })]
}

// =============================================================================
// Service stack
// =============================================================================

/// Services wired over an in-memory store, with analysis run inline on webhook
/// delivery.
pub struct TestStack {
    pub store: Arc<MemoryJobStore>,
    pub scraper: Arc<MockScrapeProvider>,
    pub analyzer: Arc<MockAnalysisProvider>,
    pub trigger: Arc<AnalysisTrigger>,
    pub scraping: ScrapingService,
    pub webhook: WebhookIngestor,
}

impl TestStack {
    pub fn new(scraper: MockScrapeProvider, analyzer: MockAnalysisProvider) -> Self {
        let store = Arc::new(MemoryJobStore::new());
        let scraper = Arc::new(scraper);
        let analyzer = Arc::new(analyzer);

        let dyn_store: Arc<dyn JobStore> = store.clone();
        let trigger = Arc::new(AnalysisTrigger::new(dyn_store.clone(), analyzer.clone()));
        let dispatcher = ScrapeDispatcher::new(dyn_store.clone(), scraper.clone(), WEBHOOK_BASE);
        let scraping = ScrapingService::new(dyn_store.clone(), dispatcher, trigger.clone());
        let webhook = WebhookIngestor::new(dyn_store, trigger.clone());

        Self {
            store,
            scraper,
            analyzer,
            trigger,
            scraping,
            webhook,
        }
    }
}
