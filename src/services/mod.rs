pub mod analysis;
pub mod analyzer;
pub mod brightdata;
pub mod countries;
pub mod dispatcher;
pub mod prompts;
pub mod queue;
pub mod retry_policy;
pub mod scraping;
pub mod sweeper;
pub mod webhook;
