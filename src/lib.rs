//! AI Answer SEO Report Service
//!
//! Sends a user's prompt to an AI answer engine through a scraping provider,
//! receives the scraped answers by webhook, and turns them into an SEO report
//! with an analysis model. Jobs move through a persisted state machine with
//! analysis-only ("smart") retries when the scrape already succeeded.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
