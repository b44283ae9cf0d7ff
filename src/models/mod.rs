pub mod job;
pub mod report;
pub mod scrape;
pub mod webhook;
