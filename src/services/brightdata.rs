use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::ProviderError;

const PERPLEXITY_URL: &str = "https://www.perplexity.ai";
const OUTPUT_FIELDS: &[&str] = &[
    "url",
    "prompt",
    "answer_text",
    "sources",
    "citations",
    "timestamp",
    "input",
];

/// A scrape submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    pub prompt: String,
    pub country: String,
    /// Delivery address; carries the job id as a query parameter.
    pub callback_url: String,
}

/// Provider acknowledgement of an accepted scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeAccepted {
    pub snapshot_id: Option<String>,
}

/// External scrape provider.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn submit(&self, request: &ScrapeRequest) -> Result<ScrapeAccepted, ProviderError>;
}

/// Client for the Bright Data datasets API (Perplexity scraper dataset).
pub struct BrightDataClient {
    http: Client,
    api_key: String,
    dataset_id: String,
    base_url: String,
}

#[derive(Serialize)]
struct ScrapeBody<'a> {
    input: Vec<ScrapeInput<'a>>,
    custom_output_fields: &'a [&'a str],
}

#[derive(Serialize)]
struct ScrapeInput<'a> {
    url: &'a str,
    prompt: &'a str,
    country: &'a str,
    index: u32,
}

impl BrightDataClient {
    pub fn new(api_key: &str, dataset_id: &str, base_url: &str) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            dataset_id: dataset_id.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ScrapeProvider for BrightDataClient {
    async fn submit(&self, request: &ScrapeRequest) -> Result<ScrapeAccepted, ProviderError> {
        let url = format!("{}/datasets/v3/scrape", self.base_url);
        let body = ScrapeBody {
            input: vec![ScrapeInput {
                url: PERPLEXITY_URL,
                prompt: &request.prompt,
                country: &request.country,
                index: 1,
            }],
            custom_output_fields: OUTPUT_FIELDS,
        };

        let response = self
            .http
            .post(&url)
            .query(&[
                ("dataset_id", self.dataset_id.as_str()),
                ("custom_output_fields", "url"),
                ("notify", request.callback_url.as_str()),
                ("include_errors", "true"),
            ])
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            });
        }

        // A success response without a JSON body still means the scrape was accepted.
        let data: Option<serde_json::Value> = response.json().await.ok();
        let snapshot_id = data
            .as_ref()
            .and_then(|d| d.get("snapshot_id"))
            .and_then(|s| s.as_str())
            .map(str::to_string);

        Ok(ScrapeAccepted { snapshot_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_body_shape() {
        let body = ScrapeBody {
            input: vec![ScrapeInput {
                url: PERPLEXITY_URL,
                prompt: "best CRM software",
                country: "US",
                index: 1,
            }],
            custom_output_fields: OUTPUT_FIELDS,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["input"][0]["url"], "https://www.perplexity.ai");
        assert_eq!(json["input"][0]["country"], "US");
        assert_eq!(json["custom_output_fields"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BrightDataClient::new("key", "gd_123", "https://api.brightdata.com/").unwrap();
        assert_eq!(client.base_url, "https://api.brightdata.com");
    }
}
